//! Footer composition for outbound notification bodies.
//!
//! Format:
//! ```html
//! <p>--<br />Alice</p>
//! <div><br /><small>Sent by <a ...>Acme</a> using <a ...>Herald</a>.</small></div>
//! ```

use herald_core::partner::Partner;
use serde::Deserialize;

/// Organisation and platform identity rendered into the sent-by line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Branding {
  pub org_name:      String,
  /// Rendered as a link when set; `http://` is prefixed when the value
  /// carries no scheme.
  pub org_website:   Option<String>,
  pub platform_name: String,
  /// Rendered as a link when non-empty.
  pub platform_url:  String,
}

impl Default for Branding {
  fn default() -> Self {
    Self {
      org_name:      String::new(),
      org_website:   None,
      platform_name: "Herald".into(),
      platform_url:  String::new(),
    }
  }
}

/// Append `content` to an HTML document, optionally wrapped in
/// `container_tag`. The fragment lands before `</body>` (or `</html>`) when
/// present, else it is plainly concatenated. An empty base yields just the
/// wrapped fragment.
pub fn append_content_to_html(
  html: &str,
  content: &str,
  container_tag: Option<&str>,
) -> String {
  let fragment = match container_tag {
    Some(tag) => format!("<{tag}>{content}</{tag}>"),
    None => content.to_string(),
  };

  match html.find("</body>").or_else(|| html.find("</html>")) {
    Some(at) => format!("{}{}{}", &html[..at], fragment, &html[at..]),
    None => format!("{html}{fragment}"),
  }
}

/// Build the standard footer for notification emails.
///
/// Returns an empty string when no actor is supplied. With
/// `include_signature`, the actor's own signature HTML is used when set,
/// else a synthesized `--<br />name` line. The sent-by line is always
/// appended.
pub fn compose_footer(
  actor: Option<&Partner>,
  branding: &Branding,
  include_signature: bool,
) -> String {
  let Some(actor) = actor else {
    return String::new();
  };

  let mut footer = String::new();

  if include_signature {
    let signature = match actor.signature.as_deref() {
      Some(sig) if !sig.is_empty() => sig.to_string(),
      _ => format!("--<br />{}", actor.name),
    };
    footer = append_content_to_html(&footer, &signature, Some("p"));
  }

  let org = match branding.org_website.as_deref() {
    Some(site) if !site.is_empty() => {
      let lower = site.to_lowercase();
      let url = if lower.starts_with("http:") || lower.starts_with("https:") {
        site.to_string()
      } else {
        format!("http://{site}")
      };
      format!("<a style='color:inherit' href='{url}'>{}</a>", branding.org_name)
    }
    _ => branding.org_name.clone(),
  };

  let platform = if branding.platform_url.is_empty() {
    branding.platform_name.clone()
  } else {
    format!(
      "<a style='color:inherit' href='{}'>{}</a>",
      branding.platform_url, branding.platform_name
    )
  };

  let sent_by = format!("<br /><small>Sent by {org} using {platform}.</small>");
  append_content_to_html(&footer, &sent_by, Some("div"))
}
