use crate::call::AssembledCall;
use instruction::RawInstruction;
use memchr::memchr;
use serde_json::Value;

const FENCE_LEN: usize = 3;

/// Tags whose fenced blocks may carry instructions. Anything else (sample
/// code, prose-highlighted output) is ignored wholesale.
fn tag_eligible(tag: &str) -> bool {
    matches!(
        tag,
        "" | "render" | "json" | "javascript" | "js" | "ts" | "typescript"
    )
}

#[derive(Debug)]
struct OpenBlock {
    /// Offset of the opening fence itself.
    fence_start: usize,
    /// Offset just past the opening fence (start of the info line).
    inner_start: usize,
    /// Resume position for the closing-fence search, so a long streaming
    /// block is not rescanned from its start on every chunk.
    close_from: usize,
}

/// Extracts instructions from fenced code blocks in incrementally appended
/// free text.
///
/// The buffer is append-only within a block; a completed block (both fences
/// included) is spliced out and scanning restarts from the buffer head,
/// since offsets shift. An opened block that never closes is resolved
/// best-effort by [`BlockAssembler::flush`] at stream end.
#[derive(Debug, Default)]
pub struct BlockAssembler {
    buffer: String,
    /// Resume position for the opening-fence search.
    scan_from: usize,
    open: Option<OpenBlock>,
    emitted: u64,
}

impl BlockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of stream text and return every instruction whose
    /// block completed with this chunk, in document order.
    pub fn push(&mut self, chunk: &str) -> Vec<AssembledCall> {
        self.buffer.push_str(chunk);
        let mut calls = Vec::new();
        loop {
            if self.open.is_none() {
                match find_fence(&self.buffer, self.scan_from) {
                    Some(pos) => {
                        self.open = Some(OpenBlock {
                            fence_start: pos,
                            inner_start: pos + FENCE_LEN,
                            close_from: pos + FENCE_LEN,
                        });
                    }
                    None => {
                        self.scan_from = resume_before_partial_fence(&self.buffer);
                        break;
                    }
                }
            }
            let open = self.open.as_mut().expect("an open fence was just recorded");
            match find_fence(&self.buffer, open.close_from.max(open.inner_start)) {
                Some(close) => {
                    let inner = self.buffer[open.inner_start..close].to_string();
                    let span = open.fence_start..close + FENCE_LEN;
                    self.buffer.replace_range(span, "");
                    self.open = None;
                    self.scan_from = 0;
                    self.collect_block(&inner, &mut calls);
                }
                None => {
                    open.close_from = resume_before_partial_fence(&self.buffer);
                    break;
                }
            }
        }
        calls
    }

    /// Stream end: best-effort parse of an unterminated trailing block, then
    /// return to a clean state. Parse failures are swallowed; there is no
    /// sender left to notify.
    pub fn flush(&mut self) -> Vec<AssembledCall> {
        let mut calls = Vec::new();
        if let Some(open) = self.open.take() {
            log::debug!(target: "assembler.text", "flushing unterminated block at stream end");
            let inner = self.buffer[open.inner_start..].to_string();
            self.collect_block(&inner, &mut calls);
        }
        self.buffer.clear();
        self.scan_from = 0;
        calls
    }

    /// Return to a fresh state for session reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
        self.open = None;
        self.emitted = 0;
    }

    fn collect_block(&mut self, inner: &str, calls: &mut Vec<AssembledCall>) {
        // The info line runs from the opening fence to the first newline; a
        // block with no newline has an info line and no content.
        let (info, content) = match inner.find('\n') {
            Some(nl) => (&inner[..nl], &inner[nl + 1..]),
            None => (inner, ""),
        };
        let tag = info.trim().split_whitespace().next().unwrap_or("");
        if !tag_eligible(tag) {
            log::trace!(target: "assembler.text", "ignoring block with tag {tag:?}");
            return;
        }
        for raw in extract_instructions(content) {
            let call_id = format!("block-{}", self.emitted);
            self.emitted += 1;
            calls.push(AssembledCall::new(call_id, raw));
        }
    }
}

/// Find the next triple-backtick fence at or after `from`.
fn find_fence(buffer: &str, from: usize) -> Option<usize> {
    let bytes = buffer.as_bytes();
    let mut start = from;
    while start + FENCE_LEN <= bytes.len() {
        let rel = memchr(b'`', &bytes[start..])?;
        let pos = start + rel;
        if pos + FENCE_LEN <= bytes.len() && &bytes[pos..pos + FENCE_LEN] == b"```" {
            return Some(pos);
        }
        start = pos + 1;
    }
    None
}

/// Resume offset that keeps a partial fence at the buffer tail (one or two
/// trailing backticks) inside the next scan window. Backticks are ASCII, so
/// the result is always a char boundary.
fn resume_before_partial_fence(buffer: &str) -> usize {
    let bytes = buffer.as_bytes();
    let trailing = bytes.iter().rev().take(2).take_while(|b| **b == b'`').count();
    buffer.len() - trailing
}

/// Parse ladder for completed block content, by leading character: a JSON
/// array of candidates, a single JSON object, or newline-separated objects.
/// Invalid entries are skipped, never fatal.
fn extract_instructions(content: &str) -> Vec<RawInstruction> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match trimmed.as_bytes()[0] {
        b'[' => match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(elements) => elements.iter().filter_map(candidate).collect(),
            Err(err) => {
                log::debug!(target: "assembler.text", "discarding malformed array block: {err}");
                Vec::new()
            }
        },
        b'{' => serde_json::from_str::<Value>(trimmed)
            .ok()
            .as_ref()
            .and_then(candidate)
            .into_iter()
            .collect(),
        _ => trimmed
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
            .filter_map(|value| candidate(&value))
            .collect(),
    }
}

/// A candidate is valid with a non-empty `name` and a present `arguments`
/// (object or string). Anything else is dropped.
fn candidate(value: &Value) -> Option<RawInstruction> {
    let object = value.as_object()?;
    let name = object.get("name")?.as_str()?;
    if name.is_empty() {
        return None;
    }
    let arguments = object.get("arguments")?;
    if !matches!(arguments, Value::Object(_) | Value::String(_)) {
        return None;
    }
    Some(RawInstruction::new(name, arguments.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(calls: &[AssembledCall]) -> Vec<&str> {
        calls.iter().map(|c| c.instruction.name.as_str()).collect()
    }

    #[test]
    fn block_split_across_calls_emits_exactly_once() {
        let mut assembler = BlockAssembler::new();
        let first = assembler.push("```render\n[{\"name\":\"create\",\"arguments\":{");
        assert!(first.is_empty());
        let second = assembler.push("\"parentId\":null,\"label\":\"div\"}}]\n```");
        assert_eq!(names(&second), vec!["create"]);
        assert!(assembler.flush().is_empty());
    }

    #[test]
    fn fence_split_mid_backticks_is_recognized() {
        let mut assembler = BlockAssembler::new();
        assert!(assembler.push("prose ``").is_empty());
        assert!(assembler.push("`json\n{\"name\":\"remove\",\"arguments\":{\"targetId\":\"a\"}}\n``").is_empty());
        let calls = assembler.push("`");
        assert_eq!(names(&calls), vec!["remove"]);
    }

    #[test]
    fn multiple_blocks_in_one_chunk_emit_in_document_order() {
        let mut assembler = BlockAssembler::new();
        let text = "a\n```json\n{\"name\":\"create\",\"arguments\":{}}\n```\nb\n```json\n{\"name\":\"remove\",\"arguments\":{\"targetId\":\"x\"}}\n```\n";
        assert_eq!(names(&assembler.push(text)), vec!["create", "remove"]);
    }

    #[test]
    fn ineligible_tag_is_ignored() {
        let mut assembler = BlockAssembler::new();
        let calls =
            assembler.push("```python\n{\"name\":\"create\",\"arguments\":{}}\n```");
        assert!(calls.is_empty());
    }

    #[test]
    fn array_block_keeps_valid_elements_only() {
        let mut assembler = BlockAssembler::new();
        let calls = assembler.push(
            "```render\n[{\"name\":\"create\",\"arguments\":{}},{\"name\":\"\",\"arguments\":{}},{\"name\":\"remove\"}]\n```",
        );
        assert_eq!(names(&calls), vec!["create"]);
    }

    #[test]
    fn line_separated_objects_skip_bad_lines() {
        let mut assembler = BlockAssembler::new();
        let calls = assembler.push(
            "```js\ncall({\"name\":\"broken\"\n{\"name\":\"create\",\"arguments\":{}}\n{\"name\":\"setText\",\"arguments\":{\"targetId\":\"a\",\"text\":\"t\"}}\n```",
        );
        assert_eq!(names(&calls), vec!["create", "setText"]);
    }

    #[test]
    fn arguments_may_be_a_json_string() {
        let mut assembler = BlockAssembler::new();
        let calls = assembler
            .push("```json\n{\"name\":\"remove\",\"arguments\":\"{\\\"targetId\\\":\\\"a\\\"}\"}\n```");
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].instruction.arguments,
            json!("{\"targetId\":\"a\"}")
        );
    }

    #[test]
    fn flush_recovers_unterminated_block() {
        let mut assembler = BlockAssembler::new();
        assert!(assembler
            .push("```render\n{\"name\":\"create\",\"arguments\":{\"label\":\"div\"}}")
            .is_empty());
        let calls = assembler.flush();
        assert_eq!(names(&calls), vec!["create"]);
    }

    #[test]
    fn flush_with_trailing_garbage_yields_nothing() {
        let mut assembler = BlockAssembler::new();
        assembler.push("```render\nnot json at all");
        assert!(assembler.flush().is_empty());
        // And the buffer is clean for the next stream.
        let calls = assembler.push("```json\n{\"name\":\"remove\",\"arguments\":{\"targetId\":\"a\"}}\n```");
        assert_eq!(names(&calls), vec!["remove"]);
    }

    #[test]
    fn prose_with_no_fences_emits_nothing() {
        let mut assembler = BlockAssembler::new();
        assert!(assembler.push("just explaining things, no code here").is_empty());
        assert!(assembler.flush().is_empty());
    }

    #[test]
    fn bare_fence_is_eligible() {
        let mut assembler = BlockAssembler::new();
        let calls = assembler.push("```\n{\"name\":\"create\",\"arguments\":{}}\n```");
        assert_eq!(names(&calls), vec!["create"]);
    }

    #[test]
    fn call_ids_are_sequential_across_blocks() {
        let mut assembler = BlockAssembler::new();
        let a = assembler.push("```json\n{\"name\":\"create\",\"arguments\":{}}\n```");
        let b = assembler.push("```json\n{\"name\":\"create\",\"arguments\":{}}\n```");
        assert_eq!(a[0].call_id, "block-0");
        assert_eq!(b[0].call_id, "block-1");
    }
}
