use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Render Markdown to HTML with math support. Inline and display math are
/// rendered server-side through KaTeX; LaTeX-style `\(..\)` and `\[..\]`
/// delimiters are accepted alongside `$`/`$$`.
pub fn render_markdown_to_html(markdown: &str) -> String {
    let normalized = normalize_latex_delimiters(markdown);
    let parser = Parser::new_ext(&normalized, markdown_options()).map(|event| match event {
        Event::InlineMath(math) => math_event(&math, false),
        Event::DisplayMath(math) => math_event(&math, true),
        other => other,
    });

    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html_out
}

/// Plain text of the first paragraph, used as a post summary when the
/// front matter does not carry one. Inline formatting is dropped.
pub fn first_paragraph_text(markdown: &str) -> String {
    let mut text = String::new();
    let mut in_paragraph = false;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(TagEnd::Paragraph) => break,
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }

    text.trim().to_string()
}

fn math_event(source: &str, display_mode: bool) -> Event<'static> {
    Event::Html(CowStr::Boxed(render_math_html(source, display_mode).into_boxed_str()))
}

/// Rewrite `\(..\)` / `\[..\]` to the `$` / `$$` delimiters pulldown-cmark
/// understands. `\(..\)` spanning a line break is promoted to display math,
/// matching how such breaks are authored in practice. An unclosed opener is
/// copied through verbatim.
fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((before, open, after)) = split_at_opener(rest) {
        out.push_str(before);

        let close = if open == "\\(" { "\\)" } else { "\\]" };
        let Some(close_at) = after.find(close) else {
            out.push_str(open);
            rest = after;
            continue;
        };

        let content = &after[..close_at];
        let display = open == "\\[" || content.contains('\n');
        let fence = if display { "$$" } else { "$" };
        out.push_str(fence);
        out.push_str(content);
        out.push_str(fence);

        rest = &after[close_at + close.len()..];
    }

    out.push_str(rest);
    out
}

/// Split at the earliest `\(` or `\[`, returning (before, opener, after).
fn split_at_opener(input: &str) -> Option<(&str, &str, &str)> {
    let paren = input.find("\\(");
    let bracket = input.find("\\[");
    let at = match (paren, bracket) {
        (Some(p), Some(b)) => p.min(b),
        (Some(p), None) => p,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&input[..at], &input[at..at + 2], &input[at + 2..]))
}

fn render_math_html(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    let rendered = match opts.build() {
        Ok(opts) => katex::render_with_opts(source, opts),
        Err(_) => return fallback_math_html(source, display_mode),
    };

    match rendered {
        Ok(html) => html,
        Err(_) => fallback_math_html(source, display_mode),
    }
}

fn fallback_math_html(source: &str, display_mode: bool) -> String {
    let class_name = if display_mode { "math math-display" } else { "math math-inline" };
    format!("<span class=\"{class_name}\">{source}</span>")
}
