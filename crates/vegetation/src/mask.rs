//! Scene classification codes that exclude a pixel from the vegetation index.
//!
//! Defaults follow the Sentinel-2 Level-2A scene classification layer (SCL):
//!
//! | code | class |
//! |---|---|
//! | 0 | no data |
//! | 1 | saturated or defective |
//! | 3 | cloud shadow |
//! | 6 | water |
//! | 8 | cloud, medium probability |
//! | 9 | cloud, high probability |
//! | 10 | thin cirrus |
//! | 11 | snow or ice |
//!
//! SCL has no built-up class, so `urban` is empty unless the catalog provides
//! a land-cover layer with one.

use serde::{Deserialize, Serialize};

/// Why a pixel was left out of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskReason {
    /// Any input band, or the mask itself, held no-data.
    NoData,
    /// `nir + red == 0` or the ratio was not finite.
    InvalidReflectance,
    Water,
    Urban,
    Cloud,
    CloudShadow,
    Snow,
    /// Saturated or defective sensor reading.
    Defective,
}

/// Class codes for each mask reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskClasses {
    pub no_data: Vec<u16>,
    pub defective: Vec<u16>,
    pub water: Vec<u16>,
    pub urban: Vec<u16>,
    pub cloud: Vec<u16>,
    pub cloud_shadow: Vec<u16>,
    pub snow: Vec<u16>,
}

impl Default for MaskClasses {
    fn default() -> Self {
        Self::sentinel2_scl()
    }
}

impl MaskClasses {
    /// Sentinel-2 L2A SCL codes.
    pub fn sentinel2_scl() -> Self {
        Self {
            no_data: vec![0],
            defective: vec![1],
            water: vec![6],
            urban: Vec::new(),
            cloud: vec![8, 9, 10],
            cloud_shadow: vec![3],
            snow: vec![11],
        }
    }

    /// Classify a mask pixel value.
    ///
    /// Returns `None` for classes that keep the pixel. Values that are not a
    /// whole number in `u16` range are treated as no-data.
    pub fn classify(&self, value: f32) -> Option<MaskReason> {
        if !value.is_finite() || value < 0.0 || value > u16::MAX as f32 || value.fract() != 0.0 {
            return Some(MaskReason::NoData);
        }
        let code = value as u16;

        if self.no_data.contains(&code) {
            Some(MaskReason::NoData)
        } else if self.water.contains(&code) {
            Some(MaskReason::Water)
        } else if self.urban.contains(&code) {
            Some(MaskReason::Urban)
        } else if self.cloud.contains(&code) {
            Some(MaskReason::Cloud)
        } else if self.cloud_shadow.contains(&code) {
            Some(MaskReason::CloudShadow)
        } else if self.snow.contains(&code) {
            Some(MaskReason::Snow)
        } else if self.defective.contains(&code) {
            Some(MaskReason::Defective)
        } else {
            None
        }
    }

    /// Check that no code is assigned to two different reasons.
    pub fn validate(&self) -> Result<(), String> {
        let groups: [(&str, &Vec<u16>); 7] = [
            ("no_data", &self.no_data),
            ("defective", &self.defective),
            ("water", &self.water),
            ("urban", &self.urban),
            ("cloud", &self.cloud),
            ("cloud_shadow", &self.cloud_shadow),
            ("snow", &self.snow),
        ];

        for (i, (name_a, codes_a)) in groups.iter().enumerate() {
            for (name_b, codes_b) in &groups[i + 1..] {
                if let Some(code) = codes_a.iter().find(|c| codes_b.contains(c)) {
                    return Err(format!(
                        "mask class code {} is listed under both '{}' and '{}'",
                        code, name_a, name_b
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scl_defaults() {
        let classes = MaskClasses::default();
        assert_eq!(classes.classify(4.0), None); // vegetation
        assert_eq!(classes.classify(5.0), None); // bare soil
        assert_eq!(classes.classify(6.0), Some(MaskReason::Water));
        assert_eq!(classes.classify(9.0), Some(MaskReason::Cloud));
        assert_eq!(classes.classify(3.0), Some(MaskReason::CloudShadow));
        assert_eq!(classes.classify(0.0), Some(MaskReason::NoData));
        assert_eq!(classes.classify(11.0), Some(MaskReason::Snow));
    }

    #[test]
    fn test_non_integral_codes_are_nodata() {
        let classes = MaskClasses::default();
        assert_eq!(classes.classify(4.5), Some(MaskReason::NoData));
        assert_eq!(classes.classify(f32::NAN), Some(MaskReason::NoData));
        assert_eq!(classes.classify(-1.0), Some(MaskReason::NoData));
    }

    #[test]
    fn test_urban_code_from_land_cover() {
        let classes = MaskClasses {
            urban: vec![50],
            ..MaskClasses::default()
        };
        assert_eq!(classes.classify(50.0), Some(MaskReason::Urban));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut classes = MaskClasses::default();
        assert!(classes.validate().is_ok());

        classes.urban = vec![6];
        let err = classes.validate().unwrap_err();
        assert!(err.contains("'water'") && err.contains("'urban'"));
    }
}
