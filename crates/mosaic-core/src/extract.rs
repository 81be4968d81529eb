//! Candidate program extraction from model responses.

/// Pulls the candidate program out of a raw model response.
///
/// The last complete fenced code block wins; the fence's language tag is
/// discarded. A response without a complete fenced block is taken as code
/// wholesale. Returns `None` when the resulting program text is empty, which
/// the caller records as a `no_code` failure.
pub fn extract_program(response: &str) -> Option<String> {
    let program = match last_fenced_block(response) {
        Some(block) => block,
        None => response.trim().to_string(),
    };
    if program.is_empty() {
        return None;
    }
    Some(program)
}

fn last_fenced_block(response: &str) -> Option<String> {
    let mut last_block = None;
    let mut current_block: Option<Vec<&str>> = None;

    for line in response.lines() {
        if line.trim_start().starts_with("```") {
            match current_block.take() {
                Some(lines) => last_block = Some(lines.join("\n")),
                None => current_block = Some(Vec::new()),
            }
            continue;
        }
        if let Some(lines) = current_block.as_mut() {
            lines.push(line);
        }
    }

    last_block.map(|block| block.trim().to_string())
}
