//! Recommended GGUF models for the local provider, grouped by hardware tier

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Hardware class a local model is suited to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareTier {
    /// Laptops and machines without a dedicated GPU
    Low,
    /// Mid-range GPUs
    Medium,
    /// Workstations with large VRAM
    High,
}

impl HardwareTier {
    /// All tiers, weakest first
    pub const ALL: [HardwareTier; 3] = [HardwareTier::Low, HardwareTier::Medium, HardwareTier::High];
}

impl fmt::Display for HardwareTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HardwareTier::Low => "low",
            HardwareTier::Medium => "medium",
            HardwareTier::High => "high",
        })
    }
}

impl FromStr for HardwareTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(HardwareTier::Low),
            "medium" => Ok(HardwareTier::Medium),
            "high" => Ok(HardwareTier::High),
            other => Err(format!(
                "Unknown hardware tier '{}'. Must be one of: low, medium, high",
                other
            )),
        }
    }
}

/// A downloadable model suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedModel {
    /// Hardware tier
    pub tier: HardwareTier,
    /// Hugging Face repository id
    pub repo_id: &'static str,
    /// GGUF file inside the repository
    pub filename: &'static str,
    /// Short description
    pub description: &'static str,
    /// Minimum hardware
    pub requirements: &'static str,
}

const CATALOG: &[RecommendedModel] = &[
    RecommendedModel {
        tier: HardwareTier::Low,
        repo_id: "microsoft/Phi-3-mini-4k-instruct-gguf",
        filename: "Phi-3-mini-4k-instruct-q4.gguf",
        description: "Microsoft's 3.8B model, best in its class for the size",
        requirements: ">= 4GB VRAM or >= 8GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Low,
        repo_id: "google/gemma-2b-it-gguf",
        filename: "gemma-2b-it.Q4_K_M.gguf",
        description: "Google's 2B model tuned for dialogue and instructions",
        requirements: ">= 3GB VRAM or >= 8GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Low,
        repo_id: "lmstudio-ai/stablelm-2-zephyr-1_6b-GGUF",
        filename: "stablelm-2-zephyr-1_6b-Q4_K_M.gguf",
        description: "Very compact 1.6B model for the weakest systems",
        requirements: ">= 2GB VRAM or >= 8GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Medium,
        repo_id: "meta-llama/Llama-3-8B-Instruct-GGUF",
        filename: "Meta-Llama-3-8B-Instruct-Q4_K_M.gguf",
        description: "Meta's 8B instruct model, among the best at its size",
        requirements: ">= 8GB VRAM or >= 16GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Medium,
        repo_id: "mistralai/Mistral-7B-Instruct-v0.2-GGUF",
        filename: "mistral-7b-instruct-v0.2.Q4_K_M.gguf",
        description: "Mistral AI's 7B classic; fast and still very capable",
        requirements: ">= 6GB VRAM or >= 16GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Medium,
        repo_id: "IlyaGusev/saiga_mistral_7b_gguf",
        filename: "model-q4_K.gguf",
        description: "Mistral 7B fine-tuned on Russian data",
        requirements: ">= 6GB VRAM or >= 16GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::Medium,
        repo_id: "google/gemma-7b-it-gguf",
        filename: "gemma-7b-it.Q4_K_M.gguf",
        description: "Gemma 7B, an alternative to Llama and Mistral",
        requirements: ">= 6GB VRAM or >= 16GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::High,
        repo_id: "mistralai/Mixtral-8x7B-Instruct-v0.1-GGUF",
        filename: "mixtral-8x7b-instruct-v0.1.Q4_K_M.gguf",
        description: "Mixture-of-experts model with near GPT-3.5 quality",
        requirements: ">= 24GB VRAM or >= 48GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::High,
        repo_id: "NousResearch/Nous-Hermes-2-Yi-34B-GGUF",
        filename: "nous-hermes-2-yi-34b.Q5_K_M.gguf",
        description: "Strong 34B model for machines short of 70B-class VRAM",
        requirements: ">= 24GB VRAM or >= 32GB RAM (CPU)",
    },
    RecommendedModel {
        tier: HardwareTier::High,
        repo_id: "meta-llama/Llama-3-70B-Instruct-GGUF",
        filename: "Meta-Llama-3-70B-Instruct.Q3_K_M.gguf",
        description: "Meta's flagship 70B model at Q3 quantization",
        requirements: ">= 32GB VRAM or >= 64GB RAM (CPU)",
    },
];

/// Recommended models, optionally restricted to one tier
pub fn recommended_models(tier: Option<HardwareTier>) -> Vec<&'static RecommendedModel> {
    CATALOG
        .iter()
        .filter(|m| tier.map_or(true, |t| m.tier == t))
        .collect()
}
