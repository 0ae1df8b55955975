//! Build progress indicator interface and state

/// Total units of a progress indicator; progress is tracked in percent
pub const PROGRESS_TOTAL: u32 = 100;

/// Appearance of a progress indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOptions {
    /// Bar width in columns
    pub width: u16,
    pub total: u32,
    /// Remove the bar from the terminal when terminated
    pub clear: bool,
    pub complete_char: char,
    pub incomplete_char: char,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            width: 64,
            total: PROGRESS_TOTAL,
            clear: true,
            complete_char: '=',
            incomplete_char: ' ',
        }
    }
}

/// A live progress indicator
pub trait ProgressIndicator {
    /// Move forward by `delta` units
    fn advance(&mut self, delta: u32);

    fn is_complete(&self) -> bool;

    /// Units completed so far
    fn current(&self) -> u32;

    /// Stop drawing; the indicator is not used afterwards
    fn terminate(&mut self);
}

/// Creates progress indicators
pub trait ProgressFactory {
    type Indicator: ProgressIndicator;

    fn create(&mut self, label: &str, options: &ProgressOptions) -> Self::Indicator;
}

/// Bundle build progress, owned by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildProgressState {
    /// Between a build start and its finish
    pub is_active: bool,

    /// 0-100, never decreases while active
    pub current_percent: u8,
}

impl BuildProgressState {
    pub fn started() -> Self {
        Self {
            is_active: true,
            current_percent: 0,
        }
    }

    /// Record a new percentage.
    ///
    /// Returns the positive delta to advance by, or `None` when the build is
    /// idle or the value does not move forward.
    pub fn advance_to(&mut self, percent: u8) -> Option<u32> {
        if !self.is_active {
            return None;
        }
        let percent = percent.min(100);
        if percent <= self.current_percent {
            return None;
        }
        let delta = u32::from(percent - self.current_percent);
        self.current_percent = percent;
        Some(delta)
    }

    pub fn finish(&mut self) {
        self.is_active = false;
    }
}
