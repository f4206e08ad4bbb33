use serde::Deserialize;

/// Query parameters of `GET /scan`
///
/// Every field is optional; missing values stay empty or zero and the scanner
/// defaults apply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    pub format: String,
    pub resolution: u32,
    pub mode: String,
    pub gamma: f64,
}

/// A finished scan ready to be sent back
#[derive(Debug)]
pub struct ScannedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}
