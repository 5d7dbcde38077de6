use tracing::debug;

/// Options after which the interpreter will not read a source file:
/// run-module, run-command, and read-from-stdin.
const INLINE_TARGET_OPTIONS: [&str; 3] = ["-m", "-c", "-"];

/// Options whose value arrives as a separate following argument.
///
/// Encoded from CPython's option table. The attached spellings
/// (`-Wignore`, `-Xdev`) look like ordinary option tokens and are
/// already skipped singly, so they need no entry here.
const OPTIONS_WITH_VALUE: [&str; 3] = ["-W", "-X", "--check-hash-based-pycs"];

/// Scan an interpreter argument vector and return the source-file
/// argument, if any.
///
/// Mirrors the interpreter's own left-to-right grammar: option tokens
/// are skipped (together with their value argument where one follows),
/// and the first token that is neither an option nor an option value is
/// the script path. `-m`, `-c`, and `-` mean there is no script at all,
/// regardless of what comes after them.
pub fn find_source_arg<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        if INLINE_TARGET_OPTIONS.contains(&arg) {
            return None;
        }
        if OPTIONS_WITH_VALUE.contains(&arg) {
            iter.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        debug!(source = arg, "classified source argument");
        return Some(arg);
    }
    None
}
