use serde::{Deserialize, Serialize};

use super::enums::ModelError;

/// Analysis focus offered by the hub. A module only shapes the insight
/// prompt; every module runs the same retrieval pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubModule {
    MutationRisk,
    TumorEvolution,
    DigitalTwin,
    CrisprEditing,
    NanoparticleDelivery,
    Pharmacovigilance,
}

impl HubModule {
    pub const ALL: [HubModule; 6] = [
        Self::MutationRisk,
        Self::TumorEvolution,
        Self::DigitalTwin,
        Self::CrisprEditing,
        Self::NanoparticleDelivery,
        Self::Pharmacovigilance,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::MutationRisk => "mutation_risk",
            Self::TumorEvolution => "tumor_evolution",
            Self::DigitalTwin => "digital_twin",
            Self::CrisprEditing => "crispr_editing",
            Self::NanoparticleDelivery => "nanoparticle_delivery",
            Self::Pharmacovigilance => "pharmacovigilance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::MutationRisk => "Mutation Risk Assessment",
            Self::TumorEvolution => "Tumor Evolution Prediction",
            Self::DigitalTwin => "Digital Twin",
            Self::CrisprEditing => "CRISPR Editing Feasibility",
            Self::NanoparticleDelivery => "Nanoparticle Drug Delivery",
            Self::Pharmacovigilance => "Pharmacovigilance",
        }
    }

    pub fn focus(&self) -> &'static str {
        match self {
            Self::MutationRisk => {
                "Assess the oncogenic risk suggested by these results and outline treatment options worth discussing."
            }
            Self::TumorEvolution => {
                "Describe how the tumor's mutational profile could evolve and which therapies might stay effective."
            }
            Self::DigitalTwin => {
                "Summarize the patient profile as a model for comparing candidate treatment plans."
            }
            Self::CrisprEditing => {
                "Comment on whether the listed variants are plausible gene-editing research targets."
            }
            Self::NanoparticleDelivery => {
                "Outline which drug classes could be candidates for targeted nanoparticle delivery."
            }
            Self::Pharmacovigilance => {
                "Flag potential adverse drug reactions or interactions relevant to these results."
            }
        }
    }

    /// Genes the module always asks about, whether or not they appear in the data.
    pub fn genes_of_interest(&self) -> &'static [&'static str] {
        match self {
            Self::TumorEvolution => &["TP53", "KRAS"],
            Self::CrisprEditing => &["BRAF", "EGFR"],
            _ => &[],
        }
    }
}

impl std::str::FromStr for HubModule {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| ModelError::InvalidEnum {
                field: "HubModule".into(),
                value: s.into(),
            })
    }
}

impl std::fmt::Display for HubModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_str() {
        for module in HubModule::ALL {
            assert_eq!(module.key().parse::<HubModule>().unwrap(), module);
        }
    }

    #[test]
    fn unknown_module_rejected() {
        assert!("blockchain".parse::<HubModule>().is_err());
    }

    #[test]
    fn tumor_evolution_tracks_tp53_and_kras() {
        assert_eq!(HubModule::TumorEvolution.genes_of_interest(), &["TP53", "KRAS"]);
        assert!(HubModule::MutationRisk.genes_of_interest().is_empty());
    }
}
