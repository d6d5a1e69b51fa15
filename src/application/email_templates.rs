use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    application::{ports::email_provider::OutgoingEmail, validators::first_name_hint},
    domain::entities::campaign::Campaign,
};

/// Loads campaign HTML from the template directory and fills in placeholders.
///
/// Templates are plain HTML files named `<campaign>_template.html`. Supported
/// placeholders: `{{email}}`, `{{first_name}}`, `{{order_url}}`, `{{brand}}`.
/// A missing or unreadable template falls back to a short built-in message.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    template_dir: PathBuf,
    brand: String,
    order_url: String,
}

impl EmailTemplates {
    pub fn new(template_dir: impl Into<PathBuf>, brand: &str, order_url: &str) -> Self {
        Self {
            template_dir: template_dir.into(),
            brand: brand.to_string(),
            order_url: order_url.to_string(),
        }
    }

    pub fn variables(&self, to: &str, campaign: Campaign) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("email".to_string(), to.to_string());
        vars.insert("first_name".to_string(), first_name_hint(to).to_string());
        vars.insert("subject".to_string(), campaign.subject(&self.brand));
        vars.insert("brand".to_string(), self.brand.clone());
        if campaign == Campaign::OrderReady && !self.order_url.is_empty() {
            vars.insert("order_url".to_string(), self.order_url.clone());
        }
        vars
    }

    pub async fn render(&self, to: &str, campaign: Campaign) -> OutgoingEmail {
        let path = self.template_dir.join(campaign.template_file());
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Email template not available, using fallback"
                );
                fallback_html(&self.brand, campaign)
            }
        };

        let variables = self.variables(to, campaign);
        OutgoingEmail {
            to: to.to_string(),
            campaign,
            subject: campaign.subject(&self.brand),
            html: substitute(&raw, &variables, &self.order_url),
            variables,
        }
    }
}

fn substitute(raw: &str, variables: &BTreeMap<String, String>, order_url: &str) -> String {
    let mut html = raw.to_string();
    for (key, value) in variables {
        html = html.replace(&format!("{{{{{key}}}}}"), value);
    }
    // Campaigns other than order-ready may still link to the shop.
    html.replace("{{order_url}}", order_url)
}

fn fallback_html(brand: &str, campaign: Campaign) -> String {
    let lead = match campaign {
        Campaign::Confirmation => format!("Thanks for joining {brand}'s pre-order waitlist!"),
        Campaign::OrderReady => format!(
            r#"Ordering is live. <a href="{{{{order_url}}}}">Place your {brand} order</a>."#
        ),
        _ => format!("Message from {brand}."),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="font-family:Arial,Helvetica,sans-serif;color:#2D5A27;">
    <p>{lead}</p>
    <p style="font-size:12px;color:#6b7280;">Sent to {{{{email}}}}</p>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn render_substitutes_placeholders_from_template_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("confirmation_template.html"),
            "<p>Hola {{first_name}} ({{email}}) from {{brand}}</p>",
        )
        .unwrap();

        let templates = EmailTemplates::new(dir.path(), "Itza", "https://shop.example");
        let email = templates.render("gaucho@mate.io", Campaign::Confirmation).await;

        assert_eq!(email.to, "gaucho@mate.io");
        assert_eq!(email.html, "<p>Hola gaucho (gaucho@mate.io) from Itza</p>");
        assert!(email.subject.contains("Itza"));
        assert_eq!(email.variables["first_name"], "gaucho");
    }

    #[tokio::test]
    async fn render_falls_back_when_template_missing() {
        let dir = TempDir::new().unwrap();
        let templates = EmailTemplates::new(dir.path(), "Itza", "");

        let email = templates.render("fan@mate.io", Campaign::Milestone).await;

        assert!(email.html.contains("Message from Itza."));
        assert!(email.html.contains("fan@mate.io"));
        assert!(!email.html.contains("{{"));
    }

    #[tokio::test]
    async fn order_ready_carries_order_url() {
        let dir = TempDir::new().unwrap();
        let templates = EmailTemplates::new(dir.path(), "Itza", "https://buy.example/abc");

        let email = templates.render("fan@mate.io", Campaign::OrderReady).await;

        assert!(email.html.contains("https://buy.example/abc"));
        assert_eq!(email.variables["order_url"], "https://buy.example/abc");
    }
}
