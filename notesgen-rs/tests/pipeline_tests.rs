//! End-to-end Markdown → HTML through the public API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use notesgen::convert::{convert_markdown_to_html, RenderOptions};
use notesgen::script::{BufferConsole, LogLevel};

fn options() -> RenderOptions {
    RenderOptions { template: false, console: Arc::new(BufferConsole::new()), ..RenderOptions::default() }
}

fn render(src: &str) -> String {
    convert_markdown_to_html(src, &options())
}

fn error_message(html: &str) -> Option<&str> {
    let start = html.find(r#"<span class="executable-error">Error: "#)?;
    let rest = &html[start + r#"<span class="executable-error">Error: "#.len()..];
    rest.find("</span>").map(|end| &rest[..end])
}

// ── Inline ────────────────────────────────────────────────────────────────────

#[test]
fn inline_arithmetic() {
    assert!(render("@1+1@").contains('2'));
    assert_eq!(render("Total: @10 * 4 + 2@ items"), "<p>Total: 42 items</p>");
}

#[test]
fn inline_scalars() {
    assert_eq!(render("@5@"), "<p>5</p>");
    assert_eq!(render("@true@"), "<p>true</p>");
    assert_eq!(render("@null@"), "<p>null</p>");
    assert_eq!(render("@nil@"), "<p>null</p>");
    assert_eq!(render("@7 / 2@"), "<p>3.5</p>");
    assert_eq!(render("@0/0 ~= 0/0@"), "<p>true</p>");
}

#[test]
fn inline_string_is_escaped() {
    assert_eq!(render("@'<b>bold</b>'@"), "<p>&lt;b&gt;bold&lt;/b&gt;</p>");
}

#[test]
fn inline_mapping_is_pretty_json() {
    let out = render("@{ name = 'Ada', born = 1815 }@");
    assert_eq!(
        out,
        "<p>{\n  &quot;born&quot;: 1815,\n  &quot;name&quot;: &quot;Ada&quot;\n}</p>"
    );
}

#[test]
fn inline_sequence_is_pretty_json() {
    assert_eq!(render("@{1, 2}@"), "<p>[\n  1,\n  2\n]</p>");
}

#[test]
fn integral_floats_in_structures_print_as_integers() {
    assert_eq!(render("@2^2@"), "<p>4</p>");
    assert_eq!(render("@{2^2, 10/2, 1/4}@"), "<p>[\n  4,\n  5,\n  0.25\n]</p>");
}

#[test]
fn traceback_stays_out_of_the_page() {
    let out = render("@@\nlocal function deep() error('deep') end\ndeep()\n@@");
    assert_eq!(error_message(&out), Some("deep"));
}

#[test]
fn unmatched_at_is_literal() {
    assert_eq!(render("write to me @ example"), "<p>write to me @ example</p>");
    assert_eq!(render("a @b\n\nc@ d"), "<p>a @b</p>\n<p>c@ d</p>");
}

#[test]
fn two_inline_snippets_in_one_paragraph() {
    assert_eq!(render("@1@ and @2@"), "<p>1 and 2</p>");
}

// ── Block ─────────────────────────────────────────────────────────────────────

#[test]
fn block_undefined_variable_is_an_error_span() {
    let out = render("@@\nx\n@@");
    let msg = error_message(&out).expect("error span");
    assert!(!msg.is_empty());
    assert!(msg.contains("x is not defined"));
}

#[test]
fn block_multi_statement() {
    let src = "# Sums\n\n@@\nlocal total = 0\nfor i = 1, 10 do total = total + i end\ntotal\n@@\n\ndone";
    assert_eq!(render(src), "<h1>Sums</h1>\n55\n<p>done</p>");
}

#[test]
fn block_with_shorter_inner_fence() {
    let out = render("@@@\nlocal s = 'a @@ b'\ns\n@@@\n");
    assert_eq!(out, "a @@ b");
}

#[test]
fn block_closed_by_longer_fence() {
    assert_eq!(render("@@\n3 * 3\n@@@@\nafter"), "9\n<p>after</p>");
}

#[test]
fn error_message_is_escaped() {
    let out = render("@@\nerror('<oops>')\n@@");
    assert_eq!(error_message(&out), Some("&lt;oops&gt;"));
}

// ── Isolation and limits ──────────────────────────────────────────────────────

#[test]
fn globals_do_not_leak_between_constructs() {
    let out = render("@@\nsecret = 42\nsecret\n@@\n\n@secret@");
    assert!(out.starts_with("42\n"));
    assert!(error_message(&out).unwrap_or_default().contains("secret is not defined"));
}

#[test]
fn non_terminating_snippet_fails_in_bounded_time() {
    let opts = RenderOptions { timeout: Duration::from_millis(100), ..options() };
    let started = Instant::now();
    let out = convert_markdown_to_html("@@\nwhile true do end\n@@\n\nafter", &opts);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(error_message(&out), Some("Script execution timed out after 100ms"));
    assert!(out.ends_with("<p>after</p>"));
}

#[test]
fn sandbox_hides_os_access() {
    let out = render("@os.exit(1)@");
    assert!(error_message(&out).unwrap_or_default().contains("os is not defined"));
}

#[test]
fn console_output_is_captured() {
    let console = Arc::new(BufferConsole::new());
    let opts = RenderOptions { console: console.clone(), ..options() };
    let out = convert_markdown_to_html("@@\nconsole.error('bad', 1)\nprint('ok')\n7\n@@", &opts);
    assert_eq!(out, "7");
    assert_eq!(
        console.lines(),
        vec![(LogLevel::Error, "bad 1".to_owned()), (LogLevel::Log, "ok".to_owned())]
    );
}

// ── Plain documents ───────────────────────────────────────────────────────────

#[test]
fn document_without_snippets() {
    let src = "# Notes\n\nFirst paragraph\ncontinues here.\n\n## Part <2>\n\nEnd & fin.\n";
    assert_eq!(
        render(src),
        "<h1>Notes</h1>\n<p>First paragraph\ncontinues here.</p>\n<h2>Part &lt;2&gt;</h2>\n<p>End &amp; fin.</p>"
    );
}

#[test]
fn full_page_wraps_body() {
    let opts = RenderOptions { template: true, ..options() };
    let page = convert_markdown_to_html("@6*7@", &opts);
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<body>\n<p>42</p>\n</body>"));
}
