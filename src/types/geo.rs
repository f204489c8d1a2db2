/// Error arising when trying to parse a GEO value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid geographic position: {0}")]
pub struct InvalidGeo(pub String);

/// A geographic position, written as `latitude;longitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geo {
    pub latitude: f64,
    pub longitude: f64,
}

impl Geo {
    pub fn parse(input: &str) -> Result<Self, InvalidGeo> {
        let err = || InvalidGeo(input.to_owned());
        let (latitude, longitude) = input.split_once(';').ok_or_else(err)?;
        Ok(Geo {
            latitude: latitude.trim().parse().map_err(|_| err())?,
            longitude: longitude.trim().parse().map_err(|_| err())?,
        })
    }

    pub fn format(&self) -> String {
        format!("{};{}", self.latitude, self.longitude)
    }
}
