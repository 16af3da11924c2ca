use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(GrantType {
    ClientCredentials => "client_credentials",
    Password => "password",
});

// FHIR resource type names are path segments, so they keep FHIR casing.
str_enum!(ResourceType {
    Observation => "Observation",
    DiagnosticReport => "DiagnosticReport",
});

str_enum!(RecordStatus {
    Final => "final",
    Preliminary => "preliminary",
    Unknown => "unknown",
});

str_enum!(Reducer {
    Mean => "mean",
    Sum => "sum",
    Count => "count",
});

str_enum!(InsightProvider {
    OpenAi => "openai",
    Ollama => "ollama",
});

impl RecordStatus {
    /// Lenient mapping used by normalization: anything unrecognized is `Unknown`.
    pub fn from_fhir(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "final" => Self::Final,
            "preliminary" => Self::Preliminary,
            _ => Self::Unknown,
        }
    }
}
