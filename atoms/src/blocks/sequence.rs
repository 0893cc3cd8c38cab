use serde::{Deserialize, Serialize};
use super::model::{BlockField, BlockKind, ContentBlock};
use crate::error::{ContentError, ContentResult};

/// Ordered, never-empty list of content blocks.
///
/// Array position is the order; every mutation goes through
/// [`BlockSequence::check_mutation`] before touching the list, so a rejected
/// edit leaves the sequence exactly as it was.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "Vec<ContentBlock>", into = "Vec<ContentBlock>")]
pub struct BlockSequence {
    blocks: Vec<ContentBlock>,
}

impl Default for BlockSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<ContentBlock>> for BlockSequence {
    type Error = ContentError;

    fn try_from(blocks: Vec<ContentBlock>) -> ContentResult<Self> {
        if blocks.is_empty() {
            return Err(ContentError::InvalidBlocks(
                "a block sequence cannot be empty".to_string(),
            ));
        }
        Ok(Self { blocks })
    }
}

impl From<BlockSequence> for Vec<ContentBlock> {
    fn from(sequence: BlockSequence) -> Self {
        sequence.blocks
    }
}

impl BlockSequence {
    /// Fresh editor state: a single empty text block
    pub fn new() -> Self {
        Self {
            blocks: vec![ContentBlock::empty(BlockKind::Text)],
        }
    }

    /// Rebuild on load. Structured blocks win when present; otherwise the
    /// legacy string becomes the body of a single text block.
    pub fn from_persisted(blocks: Option<Vec<ContentBlock>>, legacy: &str) -> Self {
        match blocks {
            Some(blocks) if !blocks.is_empty() => Self { blocks },
            _ => Self {
                blocks: vec![ContentBlock::text(legacy)],
            },
        }
    }

    /// Same as [`Self::from_persisted`] but starting from the stored JSON
    /// column. Unknown block kinds or malformed JSON are reported, not dropped.
    pub fn from_persisted_json(blocks_json: Option<&str>, legacy: &str) -> ContentResult<Self> {
        let blocks = match blocks_json.map(str::trim) {
            None | Some("") => None,
            Some(json) => Some(
                serde_json::from_str::<Vec<ContentBlock>>(json)
                    .map_err(|e| ContentError::InvalidBlocks(e.to_string()))?,
            ),
        };
        Ok(Self::from_persisted(blocks, legacy))
    }

    pub fn to_json(&self) -> ContentResult<String> {
        serde_json::to_string(&self.blocks).map_err(|e| ContentError::InvalidBlocks(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&ContentBlock> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentBlock> {
        self.blocks.iter()
    }

    /// Adds a default block of `kind` at the end and returns its index
    pub fn append(&mut self, kind: BlockKind) -> usize {
        self.blocks.push(ContentBlock::empty(kind));
        self.blocks.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> ContentResult<ContentBlock> {
        self.check_mutation(index, self.blocks.len().saturating_sub(1))?;
        Ok(self.blocks.remove(index))
    }

    /// Swap with the predecessor; a no-op on the first block
    pub fn move_up(&mut self, index: usize) -> ContentResult<()> {
        self.check_mutation(index, self.blocks.len())?;
        if index > 0 {
            self.blocks.swap(index - 1, index);
        }
        Ok(())
    }

    /// Swap with the successor; a no-op on the last block
    pub fn move_down(&mut self, index: usize) -> ContentResult<()> {
        self.check_mutation(index, self.blocks.len())?;
        if index + 1 < self.blocks.len() {
            self.blocks.swap(index, index + 1);
        }
        Ok(())
    }

    /// Replace one field in place without touching order or sibling fields
    pub fn update_field(&mut self, index: usize, field: BlockField) -> ContentResult<()> {
        self.check_mutation(index, self.blocks.len())?;

        let block = &mut self.blocks[index];
        match (block, field) {
            (ContentBlock::Text { body }, BlockField::Body(value)) => *body = value,
            (ContentBlock::Image { url, .. }, BlockField::Url(value)) => *url = value,
            (ContentBlock::Image { caption, .. }, BlockField::Caption(value)) => {
                *caption = value.filter(|v| !v.is_empty())
            }
            (ContentBlock::Image { source, .. }, BlockField::Source(value)) => {
                *source = value.filter(|v| !v.is_empty())
            }
            (block, field) => {
                return Err(ContentError::FieldMismatch {
                    field: field.name(),
                    kind: block.kind().as_str(),
                })
            }
        }
        Ok(())
    }

    /// Display-only flattening, regenerated on every save
    pub fn to_legacy_string(&self) -> String {
        self.blocks
            .iter()
            .map(ContentBlock::legacy_fragment)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn check_mutation(&self, index: usize, len_after: usize) -> ContentResult<()> {
        let len = self.blocks.len();
        if index >= len {
            return Err(ContentError::IndexOutOfRange { index, len });
        }
        if len_after == 0 {
            return Err(ContentError::MinimumBlocks);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a ContentBlock;
    type IntoIter = std::slice::Iter<'a, ContentBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
