use crate::models::{Act, ProgressResponse};

pub struct PageView<'a> {
    pub progress: &'a ProgressResponse,
    pub current: Option<&'a Act>,
    pub current_completed: bool,
    pub categories: Vec<String>,
    pub catalog_error: Option<&'a str>,
    pub missing_category: Option<&'a str>,
}

pub fn render_index(view: &PageView<'_>) -> String {
    let progress = view.progress;
    let goal_percent = if progress.daily_goal == 0 {
        100
    } else {
        (progress.completed_today.min(progress.daily_goal) * 100) / progress.daily_goal
    };

    INDEX_HTML
        .replace("{{DATE}}", &progress.date)
        .replace("{{STREAK}}", &progress.streak.to_string())
        .replace("{{TODAY}}", &progress.completed_today.to_string())
        .replace("{{GOAL}}", &progress.daily_goal.to_string())
        .replace("{{GOAL_PERCENT}}", &goal_percent.to_string())
        .replace("{{TOTAL}}", &progress.completed_total.to_string())
        .replace("{{BANNER}}", &render_banner(view))
        .replace("{{CATEGORY_OPTIONS}}", &render_options(&view.categories))
        .replace("{{ACT_CARD}}", &render_act(view.current, view.current_completed))
}

fn render_banner(view: &PageView<'_>) -> String {
    let mut banner = String::new();
    if let Some(err) = view.catalog_error {
        banner.push_str(&format!(
            r#"<div class="banner error">Could not load acts ({}). <form method="post" action="/act/reload"><button type="submit">Try again</button></form></div>"#,
            escape_html(err)
        ));
    }
    if let Some(category) = view.missing_category {
        banner.push_str(&format!(
            r#"<div class="banner">No acts in the "{}" category yet.</div>"#,
            escape_html(category)
        ));
    }
    banner
}

fn render_options(categories: &[String]) -> String {
    let mut options = String::from(r#"<option value="all">All categories</option>"#);
    for category in categories {
        let escaped = escape_html(category);
        options.push_str(&format!(r#"<option value="{escaped}">{escaped}</option>"#));
    }
    options
}

fn render_act(current: Option<&Act>, completed: bool) -> String {
    let Some(act) = current else {
        return r#"<p class="placeholder">Press "Give me an act" to draw one.</p>"#.to_string();
    };

    let complete_button = if completed {
        r#"<button type="button" disabled>Done</button>"#.to_string()
    } else {
        r#"<form method="post" action="/act/complete"><button class="primary" type="submit">Mark complete</button></form>"#
            .to_string()
    };

    format!(
        r#"<p class="act-text" id="act-text">{text}</p>
      <div class="tags"><span>{category}</span><span>{difficulty}</span></div>
      <div class="actions">
        {complete_button}
        <a class="button" href="/share" target="_blank" rel="noopener">Share</a>
        <button type="button" id="copy">Copy</button>
      </div>"#,
        text = escape_html(&act.act),
        category = escape_html(&act.category),
        difficulty = escape_html(&act.difficulty),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Random Acts of Kindness</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f7ee;
      --bg-2: #c9e4c5;
      --ink: #2b2a28;
      --accent: #e86a92;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #fdf1e6 60%, #f6f9f2 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle {
      margin: 4px 0 0;
      color: #5f5c57;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      display: block;
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .goal {
      height: 8px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
      margin-top: 10px;
    }

    .goal span {
      display: block;
      height: 100%;
      background: var(--accent);
    }

    .card {
      background: white;
      border-radius: 22px;
      padding: 24px;
      display: grid;
      gap: 16px;
    }

    .act-text {
      font-size: 1.4rem;
      margin: 0;
    }

    .placeholder {
      color: #8b857d;
      margin: 0;
    }

    .tags span {
      display: inline-block;
      margin-right: 8px;
      padding: 4px 12px;
      border-radius: 999px;
      background: var(--bg-1);
      font-size: 0.85rem;
    }

    .actions, .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
    }

    form {
      margin: 0;
      display: inline;
    }

    button, .button, select {
      font: inherit;
      border: none;
      border-radius: 14px;
      padding: 10px 18px;
      background: var(--bg-1);
      color: var(--ink);
      cursor: pointer;
      text-decoration: none;
    }

    button.primary {
      background: var(--accent);
      color: white;
    }

    button:disabled {
      opacity: 0.6;
      cursor: default;
    }

    .banner {
      border-radius: 14px;
      padding: 12px 16px;
      background: #fff4d6;
    }

    .banner.error {
      background: #ffe1e1;
    }

    footer {
      font-size: 0.9rem;
      color: #8b857d;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Random Acts of Kindness</h1>
      <p class="subtitle">{{DATE}}</p>
    </header>

    {{BANNER}}

    <section class="panel">
      <div class="stat">
        <span class="label">Streak</span>
        <span class="value">{{STREAK}} days</span>
      </div>
      <div class="stat">
        <span class="label">Today</span>
        <span class="value">{{TODAY}} / {{GOAL}}</span>
        <div class="goal"><span style="width: {{GOAL_PERCENT}}%"></span></div>
      </div>
      <div class="stat">
        <span class="label">All time</span>
        <span class="value">{{TOTAL}}</span>
      </div>
    </section>

    <section class="controls">
      <form method="post" action="/act/generate">
        <select name="category">{{CATEGORY_OPTIONS}}</select>
        <button class="primary" type="submit">Give me an act</button>
      </form>
    </section>

    <section class="card">
      {{ACT_CARD}}
    </section>

    <footer>
      Enjoying this? <a href="/donate" target="_blank" rel="noopener">Support the project</a>.
    </footer>
  </main>
  <script>
    const copyButton = document.getElementById('copy');
    if (copyButton) {
      copyButton.addEventListener('click', async () => {
        try {
          const response = await fetch('/api/share');
          if (!response.ok) {
            return;
          }
          const data = await response.json();
          await navigator.clipboard.writeText(data.clipboard_text);
          copyButton.textContent = 'Copied';
          setTimeout(() => {
            copyButton.textContent = 'Copy';
          }, 1500);
        } catch (err) {
          console.error(err);
        }
      });
    }
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> ProgressResponse {
        ProgressResponse {
            date: "2024-01-02".into(),
            streak: 3,
            completed_today: 2,
            completed_total: 9,
            daily_goal: 3,
        }
    }

    #[test]
    fn page_shows_progress_and_escapes_act_text() {
        let progress = progress();
        let act = Act {
            id: "a".into(),
            act: "<b>Be kind</b>".into(),
            category: "social".into(),
            difficulty: "easy".into(),
        };
        let html = render_index(&PageView {
            progress: &progress,
            current: Some(&act),
            current_completed: false,
            categories: vec!["social".into(), "work".into()],
            catalog_error: None,
            missing_category: None,
        });

        assert!(html.contains("3 days"));
        assert!(html.contains("2 / 3"));
        assert!(html.contains("width: 66%"));
        assert!(html.contains("&lt;b&gt;Be kind&lt;/b&gt;"));
        assert!(!html.contains("<b>Be kind</b>"));
        assert!(html.contains(r#"<option value="work">work</option>"#));
        assert!(html.contains("/act/complete"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn page_shows_banners_and_placeholder() {
        let progress = progress();
        let html = render_index(&PageView {
            progress: &progress,
            current: None,
            current_completed: false,
            categories: Vec::new(),
            catalog_error: Some("remote store answered 503"),
            missing_category: Some("garden"),
        });

        assert!(html.contains("Could not load acts"));
        assert!(html.contains(r#"No acts in the "garden" category"#));
        assert!(html.contains("Give me an act\" to draw one"));
    }
}
