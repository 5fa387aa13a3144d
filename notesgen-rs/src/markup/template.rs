//! Standalone HTML page around a compiled body.

/// Print-oriented stylesheet inlined into every page (A4, serif body text,
/// sans-serif headings, no page breaks right after a heading).
const STYLE: &str = concat!(
    "@page{size: A4;margin:0;padding:10mm}",
    "html, body{font-family: \"Times New Roman\", Georgia, serif;font-size: 11pt;",
    "line-height: 1.5;color: #000;background: #fff}",
    "h1, h2, h3, h4{font-family: \"Helvetica Neue\", Arial, sans-serif;font-weight: bold;",
    "page-break-after: avoid;page-break-inside: avoid}",
    "h1{font-size: 18pt;margin: 1.2em 0 0.6em}",
    "h2{font-size: 14pt;margin: 1em 0 0.5em}",
    "h3{font-size: 12pt;margin: 0.8em 0 0.4em}",
    "p{margin: 0.6em 0;text-align: justify;orphans: 3;widows: 3}",
    "h1, h2, h3, p{break-inside: avoid}",
    ".executable-error{color: #b00;font-family: monospace;font-size: 9pt}",
);

/// Wrap `body` in a complete HTML5 document.
pub fn html_template(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n  \
         <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <style>{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         {body}\n\
         </body>\n\
         </html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_body() {
        let page = html_template("<p>hi</p>");
        assert!(page.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">"));
        assert!(page.contains("<body>\n<p>hi</p>\n</body>\n</html>\n"));
        assert!(page.contains("<style>@page{size: A4"));
    }
}
