use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Transactional and campaign emails the waitlist can send.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Campaign {
    #[default]
    Confirmation,
    Educational,
    BrewingGuide,
    Milestone,
    Update,
    OrderReady,
}

impl Campaign {
    /// Subject line for the campaign.
    pub fn subject(&self, brand: &str) -> String {
        match self {
            Campaign::Confirmation => format!("Thanks for Joining {brand}'s Pre-order Waitlist!"),
            Campaign::Educational => {
                format!("Discover the Magic of Yerba Mate - {brand}'s Educational Guide")
            }
            Campaign::BrewingGuide => {
                "How to Brew Yerba Mate + FREE Gourd & Bombilla Offer!".to_string()
            }
            Campaign::Milestone => {
                "Celebrating 100 Customers! Your Free Gift is Confirmed".to_string()
            }
            Campaign::Update => format!("IMPORTANT: Ordering Available Tomorrow - {brand}"),
            Campaign::OrderReady => format!("{brand} - Ordering is LIVE!"),
        }
    }

    /// File name of the HTML template inside the template directory.
    pub fn template_file(&self) -> String {
        format!("{}_template.html", self.as_ref())
    }
}
