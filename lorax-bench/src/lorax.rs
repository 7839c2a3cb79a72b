//! Wire types of the LoRAX text generation API (`POST /generate`).

use serde::{Deserialize, Serialize};

use lorax_bench_lib::TargetId;

/// Target id used to address the base model, without any adapter.
pub const BASE_MODEL_TARGET: &str = "-";

/// Where the LoRAX server has to load an adapter from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdapterSource {
    /// Hugging Face hub
    Hub,
    /// S3 bucket (the adapter id is the s3 uri)
    #[default]
    S3,
    /// Local filesystem of the server
    Local,
    /// Predibase
    Pbase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub inputs: String,
    pub parameters: GenerateParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateParameters {
    pub max_new_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_source: Option<AdapterSource>,
}

impl GenerateRequest {
    /// Build the request for the given target,
    /// the base model target results in a request without adapter.
    pub fn new(
        prompt: &str,
        max_new_tokens: u32,
        target: &TargetId,
        adapter_source: AdapterSource,
    ) -> Self {
        let (adapter_id, adapter_source) = if target.as_str() == BASE_MODEL_TARGET {
            (None, None)
        } else {
            (Some(target.to_string()), Some(adapter_source))
        };

        Self {
            inputs: prompt.to_owned(),
            parameters: GenerateParameters {
                max_new_tokens,
                adapter_id,
                adapter_source,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generated_text: String,
}
