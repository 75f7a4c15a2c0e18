//! The `create_rtf_document` tool

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use super::protocol::RpcError;
use crate::Converter;
use crate::error::ConvertError;
use crate::output::{self, OutputError};

pub const CREATE_RTF_DOCUMENT: &str = "create_rtf_document";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for create_rtf_document: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl From<&ToolError> for RpcError {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::UnknownTool(_) | ToolError::InvalidArguments(_) => {
                RpcError::invalid_params(err.to_string())
            }
            ToolError::Convert(convert) => RpcError::from(convert),
            ToolError::Output(_) => RpcError::output_failure(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    content: String,
    output_path: String,
    #[serde(default)]
    template: Option<String>,
}

/// Result of a successful `create_rtf_document` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOutcome {
    pub success: bool,
    pub path: String,
    pub message: String,
    pub bytes: usize,
    pub template: String,
}

/// Runs tool invocations against a converter.
#[derive(Debug, Clone)]
pub struct Tools {
    converter: Converter,
    default_template: String,
    create_dirs: bool,
}

impl Tools {
    pub fn new(converter: Converter, default_template: impl Into<String>, create_dirs: bool) -> Self {
        Self {
            converter,
            default_template: default_template.into(),
            create_dirs,
        }
    }

    /// Tool listing for `tools/list`.
    pub fn definitions(&self) -> Value {
        json!([{
            "name": CREATE_RTF_DOCUMENT,
            "description": "Create a formatted RTF document with TextEdit compatibility",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Document content with formatting markup"
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Path where the RTF file will be saved"
                    },
                    "template": {
                        "type": "string",
                        "description": "Document template to use",
                        "enum": self.converter.registry().names(),
                        "default": self.default_template
                    }
                },
                "required": ["content", "output_path"]
            }
        }])
    }

    pub fn call(&self, name: &str, arguments: Value) -> Result<CreateOutcome, ToolError> {
        if name != CREATE_RTF_DOCUMENT {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        let args: CreateArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        self.create_rtf_document(args)
    }

    fn create_rtf_document(&self, args: CreateArgs) -> Result<CreateOutcome, ToolError> {
        let template = args.template.unwrap_or_else(|| self.default_template.clone());
        let bytes = self.converter.convert(&args.content, Some(&template))?;

        let path = output::resolve_output_path(&args.output_path)?;
        output::write_document(&path, &bytes, self.create_dirs)?;

        Ok(CreateOutcome {
            success: true,
            path: path.display().to_string(),
            message: "Document created successfully".to_string(),
            bytes: bytes.len(),
            template,
        })
    }
}
