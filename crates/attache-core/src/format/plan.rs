use crate::kind::AttachmentKind;
use std::ops::Range;
use std::path::PathBuf;

/// One planned move, produced by the planning step and applied by the
/// executor in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub kind: AttachmentKind,
    pub from: PathBuf,
    pub dest: PathBuf,
    /// Copy instead of move: the source stays put and the copy takes
    /// the destination name (shared-policy `Copy`).
    pub copy: bool,
}

/// A queued link rewrite in the note content, anchored to the source
/// span of its embed and consumed in one write at the end of the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub span: Range<usize>,
    pub old_link: String,
    pub new_link: String,
}

/// The plan of one formatting pass over one note.
#[derive(Debug, Default)]
pub struct PassPlan {
    pub renames: Vec<PlannedRename>,
    pub substitutions: Vec<Substitution>,
    /// Embeds passed over: resolution misses and shared-policy skips.
    pub skipped: usize,
}

/// Rewrite queued links in the note content. Edits are applied from
/// the back of the note so earlier spans stay valid; within its span
/// each substitution replaces the link's literal spelling, falling
/// back to the `%20`-encoded spelling when the literal one is absent.
pub(crate) fn apply_substitutions(content: &str, substitutions: &[Substitution]) -> String {
    let mut edits: Vec<&Substitution> = substitutions.iter().collect();
    edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut content = content.to_string();
    for edit in edits {
        let Some(segment) = content.get(edit.span.clone()) else {
            continue;
        };
        let rewritten = if segment.contains(&edit.old_link) {
            segment.replacen(&edit.old_link, &edit.new_link, 1)
        } else {
            let old = edit.old_link.replace(' ', "%20");
            let new = edit.new_link.replace(' ', "%20");
            segment.replacen(&old, &new, 1)
        };
        content.replace_range(edit.span.clone(), &rewritten);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substitution(span: Range<usize>, old: &str, new: &str) -> Substitution {
        Substitution {
            span,
            old_link: old.to_string(),
            new_link: new.to_string(),
        }
    }

    #[test]
    fn rewrites_only_the_anchored_embed() {
        let content = "![[a.png]] and ![[a.png]]";
        let out = apply_substitutions(content, &[substitution(15..25, "a.png", "b.png")]);
        assert_eq!(out, "![[a.png]] and ![[b.png]]");
    }

    #[test]
    fn applies_back_to_front() {
        let content = "![[a.png]] ![[b.png]]";
        let out = apply_substitutions(
            content,
            &[
                substitution(0..10, "a.png", "Trip_image_1.png"),
                substitution(11..21, "b.png", "Trip_image_2.png"),
            ],
        );
        assert_eq!(out, "![[Trip_image_1.png]] ![[Trip_image_2.png]]");
    }

    #[test]
    fn falls_back_to_encoded_spelling() {
        let content = "![](shot%201.png)";
        let out = apply_substitutions(
            content,
            &[substitution(0..17, "shot 1.png", "Trip image 1.png")],
        );
        assert_eq!(out, "![](Trip%20image%201.png)");
    }
}
