use crate::summarize::SummaryResult;
use crate::youtube::VideoRecord;

/// `"1234567"` -> `"1,234,567"`. Non-numeric input is returned as is.
pub fn group_thousands(digits: &str) -> String {
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_owned();
    }
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Unifies line endings, collapses spaces inside lines, drops empty lines and
/// repairs the ` .` spacing some models emit.
pub fn normalize_summary(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| {
            line.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .replace(" .", ".")
                .replace(" ,", ",")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        let at_boundary = matches!(ch, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_owned());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_owned());
    }
    sentences
}

/// Normalizes a raw model summary and regroups it into paragraphs of
/// `sentences_per_paragraph` sentences separated by blank lines.
pub fn format_summary(raw: &str, sentences_per_paragraph: usize) -> String {
    let normalized = normalize_summary(raw);
    let flat = normalized.replace('\n', " ");
    let per = sentences_per_paragraph.max(1);
    split_sentences(&flat)
        .chunks(per)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Display paragraphs: one per non-empty line.
pub fn paragraphs(summary: &str) -> Vec<String> {
    summary
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Human-readable report for the terminal.
pub fn report(record: &VideoRecord, summary: &SummaryResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", record.title));

    let published = record
        .published_at
        .map(|dt| dt.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "unknown".to_owned());
    output.push_str(&format!(
        "**Channel:** {} | **Published:** {} | **Duration:** {} | **Language:** {}\n",
        record.channel_title, published, record.duration, record.language
    ));
    output.push_str(&format!(
        "**Views:** {} | **Likes:** {} | **Comments:** {}\n\n",
        group_thousands(&record.statistics.view_count),
        group_thousands(&record.statistics.like_count),
        group_thousands(&record.statistics.comment_count),
    ));

    if let Some(chapters) = &record.chapters {
        output.push_str("## Chapters\n\n");
        for chapter in chapters {
            output.push_str(&format!("- [{}] {}\n", chapter.time, chapter.title));
        }
        output.push('\n');
    }

    let mut paras = summary.paragraphs().into_iter();
    if let Some(first) = paras.next() {
        output.push_str("## Key Takeaways\n\n");
        output.push_str(&first);
        output.push_str("\n\n");
    }
    for para in paras {
        output.push_str(&format!("• {para}\n"));
    }

    output.push_str(&format!("\n_Summarized by {}_\n", summary.model));
    output
}
