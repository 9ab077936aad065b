//! Current page and zoom of the document view.

pub const MIN_ZOOM_PERCENT: u16 = 50;
pub const MAX_ZOOM_PERCENT: u16 = 200;
pub const ZOOM_STEP_PERCENT: u16 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    /// 1-based page number.
    pub page: u32,
    /// Unknown until the renderer reports the loaded document.
    pub page_count: Option<u32>,
    pub zoom_percent: u16,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { page: 1, page_count: None, zoom_percent: 100 }
    }
}

impl ViewportState {
    pub fn scale(&self) -> f32 {
        f32::from(self.zoom_percent) / 100.0
    }

    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = Some(page_count);
        self.page = clamp_page(self.page, page_count);
    }

    /// Moves to `page`, clamped to the known page range.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.page = match self.page_count {
            Some(page_count) => clamp_page(page, page_count),
            None => page.max(1),
        };
        self.page
    }

    pub fn next_page(&mut self) -> u32 {
        self.go_to_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> u32 {
        self.go_to_page(self.page.saturating_sub(1))
    }

    pub fn set_zoom_percent(&mut self, percent: u16) -> u16 {
        self.zoom_percent = clamp_zoom_percent(percent);
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.set_zoom_percent(self.zoom_percent.saturating_add(ZOOM_STEP_PERCENT))
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.set_zoom_percent(self.zoom_percent.saturating_sub(ZOOM_STEP_PERCENT))
    }
}

pub fn clamp_zoom_percent(percent: u16) -> u16 {
    percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT)
}

fn clamp_page(page: u32, page_count: u32) -> u32 {
    page.clamp(1, page_count.max(1))
}
