#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status_code: u16,
    pub body: String,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Invokes the plotting function over HTTP.
pub trait PlotTrigger {
    /// Issues a GET to `url`. `Err` means the request never produced a response.
    fn trigger(&self, url: &str) -> Result<TriggerResponse, String>;
}
