use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    XmlError(quick_xml::Error),
    XmlDataError(String),
    NetworkError(String),
    JsonError(serde_json::Error),
    NotFound(String),
    InvalidInputError(String),
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::convert::From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::XmlError(e)
    }
}

impl std::convert::From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlDataError(format!("bad attribute: {}", e))
    }
}

impl std::convert::From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::XmlDataError(format!("{}", e))
    }
}

impl std::convert::From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}

impl std::convert::From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, resp) => {
                Error::NetworkError(format!("{} returned status {}", resp.get_url(), code))
            }
            ureq::Error::Transport(t) => Error::NetworkError(format!("{}", t)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn as_secs(dur: std::time::Duration) -> f64 {
    (dur.as_secs() as f64) * 1.0 + (dur.subsec_nanos() as f64) * 0.000000001
}

pub struct Timer(std::time::Instant);

impl Timer {
    pub fn new() -> Timer {
        Timer(std::time::Instant::now())
    }

    pub fn since(&self) -> f64 {
        as_secs(self.0.elapsed())
    }

    pub fn reset(&mut self) {
        self.0 = std::time::Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Timer {
        Timer::new()
    }
}

/// Parses a numeric OSM tag value such as `12`, `12.5` or `12 m`. Values
/// carrying any other unit are rejected.
pub fn parse_tag_number(val: &str) -> Option<f64> {
    let v = val.trim();
    let v = v.strip_suffix('m').map(|s| s.trim_end()).unwrap_or(v);
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f),
        _ => None,
    }
}
