//! Output formatting structures for CLI display

use gitrows_core::Row;
use tabled::Tabled;

use crate::helpers::short_hash;

/// Table row for displaying commit-file associations
#[derive(Tabled)]
pub struct AssociationRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Commit")]
    pub commit: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Blob")]
    pub blob: String,
    #[tabled(rename = "Tree")]
    pub tree: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
}

impl From<&Row> for AssociationRow {
    fn from(row: &Row) -> Self {
        Self {
            repository: row.repository_id.clone(),
            commit: short_hash(&row.commit_hash, 12).to_string(),
            path: row.file_path.clone(),
            blob: short_hash(&row.blob_hash, 12).to_string(),
            tree: short_hash(&row.tree_hash, 12).to_string(),
            mode: format!("{:06o}", row.file_mode),
        }
    }
}

/// Table row for displaying partitions
#[derive(Tabled)]
pub struct PartitionRow {
    #[tabled(rename = "Partition")]
    pub partition: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Indexed rows")]
    pub indexed: String,
}
