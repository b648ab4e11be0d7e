//! HTML shells for the dashboard's navigable pages

use crate::token::TokenRecord;

/// A routable dashboard page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub slug: &'static str,
    pub title: &'static str,
    /// Shows the signed-in navigation
    pub dashboard: bool,
}

const fn page(slug: &'static str, title: &'static str, dashboard: bool) -> Page {
    Page {
        slug,
        title,
        dashboard,
    }
}

const NAV: [(&str, &str); 5] = [
    ("/dashboard", "Dashboard"),
    ("/monitors", "Monitors"),
    ("/incidents", "Incidents"),
    ("/analytics", "Analytics"),
    ("/settings", "Settings"),
];

/// Page served at `path`, if any
pub fn lookup(path: &str) -> Option<Page> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["login"] => Some(page("login", "Sign in", false)),
        ["register"] => Some(page("register", "Create an account", false)),
        ["verify-otp"] => Some(page("verify-otp", "Verify your email", false)),
        ["forgot-password"] => Some(page("forgot-password", "Forgot your password?", false)),
        ["reset-password"] => Some(page("reset-password", "Reset your password", false)),
        ["dashboard"] => Some(page("dashboard", "Dashboard", true)),
        ["monitors"] => Some(page("monitors", "Monitors", true)),
        ["monitors", "new"] => Some(page("monitor-new", "Create New Monitor", true)),
        ["monitors", id] if !id.is_empty() => Some(page("monitor-detail", "Monitor Details", true)),
        ["monitors", id, "edit"] if !id.is_empty() => {
            Some(page("monitor-edit", "Edit Monitor", true))
        }
        ["incidents"] => Some(page("incidents", "Incidents", true)),
        ["analytics"] => Some(page("analytics", "Analytics", true)),
        ["settings"] => Some(page("settings", "Account Settings", true)),
        _ => None,
    }
}

/// Render the shell for `page`; client scripts fill it from `/api/*`
pub fn render(page: Page, user: Option<&TokenRecord>) -> String {
    let nav = if page.dashboard {
        let links: String = NAV
            .iter()
            .map(|(href, label)| {
                format!(
                    r#"<a href="{}" style="margin-right: 1rem;">{}</a>"#,
                    href, label
                )
            })
            .collect();
        let who = user
            .map(|u| escape_html(&u.name))
            .unwrap_or_default();
        format!(
            r#"<nav style="display: flex; justify-content: space-between; padding: 0.5rem 0; border-bottom: 1px solid #dee2e6;">
        <div>{links}</div>
        <div><span id="user-name">{who}</span>
            <form method="post" action="/api/auth/logout" style="display: inline;"><button type="submit">Sign out</button></form>
        </div>
    </nav>"#
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Beacon</title>
</head>
<body data-page="{slug}" style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    {nav}
    <h1>{title}</h1>
    <main id="app"></main>
</body>
</html>"#,
        title = page.title,
        slug = page.slug,
        nav = nav,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
