const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{TITLE}</title>
    <style>
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #F3F4F6;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
        }
        .card {
            background: white;
            border-radius: 12px;
            padding: 40px;
            box-shadow: 0 4px 24px rgba(0, 0, 0, 0.08);
            text-align: center;
            max-width: 420px;
        }
        .mark {
            font-size: 40px;
            color: {COLOR};
        }
        h1 {
            color: #111827;
            font-size: 22px;
        }
        p {
            color: #4B5563;
            line-height: 1.5;
        }
        code {
            display: block;
            background: #FEE2E2;
            color: #991B1B;
            border-radius: 6px;
            padding: 12px;
            margin: 16px 0;
        }
    </style>
</head>
<body>
    <div class="card">
        <div class="mark">{MARK}</div>
        <h1>{TITLE}</h1>
        {BODY}
    </div>
</body>
</html>"#;

fn render(title: &str, mark: &str, color: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("{TITLE}", title)
        .replace("{MARK}", mark)
        .replace("{COLOR}", color)
        .replace("{BODY}", body)
}

pub fn success() -> String {
    render(
        "Login complete",
        "✓",
        "#10B981",
        "<p>You can close this window and return to your terminal.</p>",
    )
}

pub fn failure(detail: &str) -> String {
    let body = format!(
        "<p>The authorization did not complete.</p><code>{}</code><p>Close this window and run <b>urur login</b> again.</p>",
        escape(detail)
    );
    render("Login failed", "✗", "#EF4444", &body)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
