use super::{CommitDocument, ToolChain, ToolChainKind};
use crate::git::CommitRecord;
use serde_json::json;

/// Node-style documents: "date author subject body" text, embedded together
/// with its metadata rendered as `key: value` lines.
pub struct LlamaIndex {
    table_name: String,
}

impl LlamaIndex {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

impl ToolChain for LlamaIndex {
    fn kind(&self) -> ToolChainKind {
        ToolChainKind::LlamaIndex
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn compose(&self, commit: &CommitRecord) -> CommitDocument {
        let text = format!(
            "{} {} {} {}",
            commit.date, commit.author, commit.subject, commit.body
        );

        let embedding_input = format!(
            "commit_hash: {}\nauthor: {}\ndate: {}\n\n{}",
            commit.hash, commit.author, commit.date, text
        );

        CommitDocument {
            text,
            embedding_input,
            metadata: json!({
                "commit_hash": commit.hash,
                "author": commit.author,
                "date": commit.date,
            }),
        }
    }
}
