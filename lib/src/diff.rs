pub const DIFF_SUFFIX: &str = ".diff";

pub fn is_diff_file(file_name: &str) -> bool {
    file_name.ends_with(DIFF_SUFFIX)
}

/// Both sides of a unified diff, reconstructed for a side-by-side view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffSides {
    pub original: String,
    pub modified: String,
}

pub fn parse_diff(diff: &str) -> DiffSides {
    let mut sides = DiffSides::default();
    let mut in_hunk = false;

    for line in diff.split('\n') {
        if line.starts_with("diff --git") {
            sides.push_both(line);
        } else if line.starts_with("index")
            || line.starts_with("--- ")
            || line.starts_with("+++ ")
        {
            continue;
        } else if line.starts_with("@@ ") {
            in_hunk = true;
            sides.push_both(line);
        } else if in_hunk {
            if line.starts_with('-') {
                push_line(&mut sides.original, line);
            } else if line.starts_with('+') {
                push_line(&mut sides.modified, line);
            } else {
                sides.push_both(line);
            }
        }
    }

    sides
}

impl DiffSides {
    fn push_both(&mut self, line: &str) {
        push_line(&mut self.original, line);
        push_line(&mut self.modified, line);
    }
}

fn push_line(target: &mut String, line: &str) {
    target.push_str(line);
    target.push('\n');
}
