//! Output file naming

/// Length of the extension stripped from input names (`.txt`, `.csv`)
const EXTENSION_LEN: usize = 4;

/// Names of the event tables written for one input log.
///
/// The base is `base_override` (minus any `.tsv` suffix) if given, else
/// `input_name` without its trailing 4-character extension. A single run is written as
/// `{base}.tsv`; several runs as `{base}_run-{i}.tsv` counting from
/// `start_run`.
pub fn output_names(
    input_name: &str,
    run_count: usize,
    start_run: usize,
    base_override: Option<&str>,
) -> Vec<String> {
    let base = match base_override {
        Some(base) => base.strip_suffix(".tsv").unwrap_or(base),
        None => strip_extension(input_name),
    };

    if run_count == 1 {
        return vec![format!("{base}.tsv")];
    }
    (start_run..start_run + run_count)
        .map(|i| format!("{base}_run-{i}.tsv"))
        .collect()
}

/// Drop a trailing `.xyz` extension; names without one are kept whole
fn strip_extension(name: &str) -> &str {
    match name.char_indices().rev().nth(EXTENSION_LEN - 1) {
        Some((idx, '.')) => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_run_ignores_start_run() {
        assert_eq!(
            output_names("Pokenogo_jitter-065-1.txt", 1, 7, None),
            vec!["Pokenogo_jitter-065-1.tsv".to_string()]
        );
    }

    #[test]
    fn test_multiple_runs() {
        assert_eq!(
            output_names("faces.csv", 3, 2, None),
            vec![
                "faces_run-2.tsv".to_string(),
                "faces_run-3.tsv".to_string(),
                "faces_run-4.tsv".to_string(),
            ]
        );
        assert_eq!(
            output_names("faces.csv", 2, 0, None),
            vec!["faces_run-0.tsv".to_string(), "faces_run-1.tsv".to_string()]
        );
    }

    #[test]
    fn test_override_replaces_input_name() {
        assert_eq!(
            output_names("faces.csv", 1, 0, Some("sub-065_task-faces_events")),
            vec!["sub-065_task-faces_events.tsv".to_string()]
        );
        assert_eq!(
            output_names("faces.csv", 2, 1, Some("sub-01_task-go")),
            vec!["sub-01_task-go_run-1.tsv".to_string(), "sub-01_task-go_run-2.tsv".to_string()]
        );
    }

    #[test]
    fn test_override_with_tsv_suffix_not_doubled() {
        assert_eq!(
            output_names("task_events.csv", 1, 0, Some("custom_name.tsv")),
            vec!["custom_name.tsv".to_string()]
        );
        assert_eq!(
            output_names("task_events.csv", 2, 1, Some("custom_name.tsv")),
            vec!["custom_name_run-1.tsv".to_string(), "custom_name_run-2.tsv".to_string()]
        );
    }

    #[test]
    fn test_no_runs_no_names() {
        assert!(output_names("faces.csv", 0, 0, None).is_empty());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("log.txt"), "log");
        assert_eq!(strip_extension("log.edat2"), "log.edat2");
        assert_eq!(strip_extension("abc"), "abc");
        assert_eq!(strip_extension(".txt"), "");
    }
}
