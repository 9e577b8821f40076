//! Block document boundary.
//!
//! An external reader turns the real document into an ordered list of
//! paragraph and table blocks; the writer side only ever replaces text and
//! leaves every other property of the document to the tool that renders it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::util::write_json_pretty;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl TableCell {
    #[cfg(test)]
    pub fn new<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraphs: paragraphs.into_iter().map(Into::into).collect(),
        }
    }

    /// Raw cell text: paragraphs joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
    Table {
        #[serde(default)]
        rows: Vec<Vec<TableCell>>,
    },
}

impl Block {
    #[cfg(test)]
    pub fn paragraph(text: impl Into<String>, style: Option<&str>) -> Self {
        Self::Paragraph {
            text: text.into(),
            style: style.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddress {
    pub block: usize,
    pub row: usize,
    pub col: usize,
}

pub trait DocumentReader {
    fn blocks(&self) -> &[Block];
}

pub trait DocumentWriter {
    fn set_paragraph_text(&mut self, block: usize, text: &str) -> Result<()>;

    /// Replaces the whole cell with a single paragraph holding `text`.
    fn set_cell_text(&mut self, address: CellAddress, text: &str) -> Result<()>;

    fn set_cell_paragraph_text(
        &mut self,
        address: CellAddress,
        paragraph: usize,
        text: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDocument {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BlockDocument {
    #[cfg(test)]
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    fn cell_mut(&mut self, address: CellAddress) -> Result<&mut TableCell> {
        match self.blocks.get_mut(address.block) {
            Some(Block::Table { rows }) => rows
                .get_mut(address.row)
                .and_then(|row| row.get_mut(address.col))
                .with_context(|| {
                    format!(
                        "table block {} has no cell at row {} column {}",
                        address.block, address.row, address.col
                    )
                }),
            Some(Block::Paragraph { .. }) => {
                bail!("block {} is a paragraph, not a table", address.block)
            }
            None => bail!("block index {} is out of range", address.block),
        }
    }
}

impl DocumentReader for BlockDocument {
    fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl DocumentWriter for BlockDocument {
    fn set_paragraph_text(&mut self, block: usize, text: &str) -> Result<()> {
        match self.blocks.get_mut(block) {
            Some(Block::Paragraph { text: current, .. }) => {
                *current = text.to_string();
                Ok(())
            }
            Some(Block::Table { .. }) => bail!("block {block} is a table, not a paragraph"),
            None => bail!("block index {block} is out of range"),
        }
    }

    fn set_cell_text(&mut self, address: CellAddress, text: &str) -> Result<()> {
        let cell = self.cell_mut(address)?;
        if cell.paragraphs.is_empty() {
            cell.paragraphs.push(text.to_string());
            return Ok(());
        }

        cell.paragraphs[0] = text.to_string();
        for paragraph in cell.paragraphs.iter_mut().skip(1) {
            paragraph.clear();
        }
        Ok(())
    }

    fn set_cell_paragraph_text(
        &mut self,
        address: CellAddress,
        paragraph: usize,
        text: &str,
    ) -> Result<()> {
        let cell = self.cell_mut(address)?;
        let slot = cell.paragraphs.get_mut(paragraph).with_context(|| {
            format!(
                "cell at block {} row {} column {} has no paragraph {}",
                address.block, address.row, address.col, paragraph
            )
        })?;
        *slot = text.to_string();
        Ok(())
    }
}

pub fn load_block_document(path: &Path) -> Result<BlockDocument> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: BlockDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse block document {}", path.display()))?;
    Ok(document)
}

pub fn write_block_document(path: &Path, document: &BlockDocument) -> Result<()> {
    write_json_pretty(path, document)
}
