//! Page copy for each revision of the Treasury Transformation page.
//!
//! All three revisions share one layout. They differ in font, palette,
//! hero image placement and card copy. Sections that must always hold three
//! entries (sidebar learning paths, resource links, cards) are fixed-size
//! arrays so a revision cannot ship with a different count.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::theme::Palette;

/// Revision of the page to serve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Revision {
    First,
    Second,
    #[default]
    Third,
}

impl Revision {
    pub const ALL: [Revision; 3] = [Revision::First, Revision::Second, Revision::Third];

    pub fn as_str(self) -> &'static str {
        match self {
            Revision::First => "first",
            Revision::Second => "second",
            Revision::Third => "third",
        }
    }

    pub fn content(self) -> SiteContent {
        match self {
            Revision::First => first_revision(),
            Revision::Second => second_revision(),
            Revision::Third => third_revision(),
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Revision::First => Palette {
                font_family: "Georgia, 'Times New Roman', serif",
                text: "#2B2B2B",
                background: "#FFFFFF",
                heading: "#0B3D91",
                section: "#0B3D91",
                section_hover: "#2F5FB3",
                accent: "#C9A227",
                sidebar: "#F1F3F8",
                divider: "#DDDDDD",
            },
            Revision::Second => Palette {
                font_family: "'Roboto', 'Helvetica Neue', Arial, sans-serif",
                text: "#333333",
                background: "#F7F9FB",
                heading: "#003B5C",
                section: "#00677F",
                section_hover: "#2A8CA3",
                accent: "#00A3AD",
                sidebar: "#EAF2F5",
                divider: "#D0D7DC",
            },
            Revision::Third => Palette {
                font_family: "'Inter', sans-serif",
                text: "#333333",
                background: "#FAFAFA",
                heading: "#012169",
                section: "#1E423C",
                section_hover: "#317068",
                accent: "#00A0A0",
                sidebar: "#F0F2F6",
                divider: "#D0D0D0",
            },
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" | "first" => Ok(Revision::First),
            "2" | "v2" | "second" => Ok(Revision::Second),
            "3" | "v3" | "third" | "latest" => Ok(Revision::Third),
            other => Err(Error::config(
                "revision",
                format!("unknown revision '{other}', expected 1, 2 or 3"),
            )),
        }
    }
}

/// An externally hosted image referenced by URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    pub alt: &'static str,
    pub width: u32,
}

/// Which side of the mission text the hero photograph sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImagePlacement {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// A bullet inside a learning path card: a bold lead-in and its description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bullet {
    pub lead: &'static str,
    pub text: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub icon: &'static str,
    pub title: &'static str,
    pub bullets: Vec<Bullet>,
}

/// Label and placeholder for one contact form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub placeholder: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteContent {
    pub page_title: &'static str,
    pub page_icon: &'static str,
    pub brand_image: Image,
    pub nav_title: &'static str,
    pub learning_paths: [&'static str; 3],
    pub resources: [ResourceLink; 3],
    pub header: &'static str,
    pub mission_heading: &'static str,
    pub mission_body: &'static str,
    pub cta_label: &'static str,
    pub hero_image: Image,
    pub image_placement: ImagePlacement,
    pub paths_heading: &'static str,
    pub cards: [Card; 3],
    pub contact_heading: &'static str,
    pub contact_blurb: &'static str,
    pub name_field: FormField,
    pub email_field: FormField,
    pub message_field: FormField,
    pub submit_label: &'static str,
    pub footer: &'static str,
}

const HERO_PHOTO: &str = "https://images.pexels.com/photos/1018635/pexels-photo-1018635.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1";

const LEARNING_PATHS: [&str; 3] = ["Excel", "Power Platforms", "Treasury Management System"];

const RESOURCES: [ResourceLink; 3] = [
    ResourceLink {
        label: "Power BI Report Templates for Back Office and Front Office",
        href: "#",
    },
    ResourceLink {
        label: "Power Automate Templates for Treasury Professionals",
        href: "#",
    },
    ResourceLink {
        label: "XML Templates using Excel for TMS Import",
        href: "#",
    },
];

const NAME_FIELD: FormField = FormField {
    label: "Your Name",
    placeholder: "Jamie",
};

const EMAIL_FIELD: FormField = FormField {
    label: "Your Professional Email",
    placeholder: "jamie@example.com",
};

fn brand_image(revision: Revision, text: &str) -> Image {
    Image {
        url: format!(
            "https://placehold.co/150x50/{}/ffffff?text={}",
            revision.palette().heading_hex(),
            text
        ),
        alt: "Brand logo",
        width: 150,
    }
}

fn hero_image() -> Image {
    Image {
        url: HERO_PHOTO.to_string(),
        alt: "Royal Crescent, Bath",
        width: 300,
    }
}

fn first_revision() -> SiteContent {
    SiteContent {
        page_title: "Treasury Transformation: Excel and Automation for Treasury Teams",
        page_icon: "💼",
        brand_image: brand_image(Revision::First, "Treasury"),
        nav_title: "Navigation",
        learning_paths: LEARNING_PATHS,
        resources: RESOURCES,
        header: "Treasury Transformation: Smarter Spreadsheets and Automated Workflows",
        mission_heading: "Helping Treasury Teams Work Smarter",
        mission_body: "Practical training for front and back office professionals who want to \
                       spend less time copying numbers between systems and more time analysing them.",
        cta_label: "Explore the Courses",
        hero_image: hero_image(),
        image_placement: ImagePlacement::Left,
        paths_heading: "Learning Paths for Treasury Professionals",
        cards: [
            Card {
                icon: "📗",
                title: "Excel for Treasury",
                bullets: vec![
                    Bullet {
                        lead: "Lookups and Pivots:",
                        text: "Reconciling bank balances against the cash forecast.",
                    },
                    Bullet {
                        lead: "Power Query:",
                        text: "Importing bank statements without manual copy and paste.",
                    },
                ],
            },
            Card {
                icon: "⚙️",
                title: "Power Platform Basics",
                bullets: vec![
                    Bullet {
                        lead: "Power Automate:",
                        text: "Scheduling the daily cash position email.",
                    },
                    Bullet {
                        lead: "Approvals:",
                        text: "Routing payment requests to the right signatory.",
                    },
                ],
            },
            Card {
                icon: "🏦",
                title: "Getting More from Your TMS",
                bullets: vec![
                    Bullet {
                        lead: "Static Data:",
                        text: "Keeping counterparties and accounts clean.",
                    },
                    Bullet {
                        lead: "Imports:",
                        text: "Loading deals and cash flows from spreadsheets.",
                    },
                ],
            },
        ],
        contact_heading: "Get in Touch",
        contact_blurb: "Questions about a course or a workflow in your team? Send a message and we will get back to you.",
        name_field: NAME_FIELD,
        email_field: EMAIL_FIELD,
        message_field: FormField {
            label: "Your Message",
            placeholder: "I would like to know more about...",
        },
        submit_label: "Send Request",
        footer: "A Treasury Resource (2025)",
    }
}

fn second_revision() -> SiteContent {
    SiteContent {
        page_title: "Treasury Transformation: Automation for the Treasury Professional",
        page_icon: "⚙️",
        brand_image: brand_image(Revision::Second, "TreasuryC"),
        nav_title: "Navigation",
        learning_paths: LEARNING_PATHS,
        resources: RESOURCES,
        header: "Treasury Transformation: Data Efficiency and the Power Platform",
        mission_heading: "Empowering Treasury Teams through Automation",
        mission_body: "This platform teaches front and back office professionals how to use the \
                       Power Platform, Excel and the TMS to remove manual work and close faster.",
        cta_label: "Start Learning",
        hero_image: hero_image(),
        image_placement: ImagePlacement::Right,
        paths_heading: "Key Learning Paths for Treasury Professionals",
        cards: [
            Card {
                icon: "📊",
                title: "Excel Mastery",
                bullets: vec![
                    Bullet {
                        lead: "Power Query:",
                        text: "Dynamic ingestion of bank and ERP extracts.",
                    },
                    Bullet {
                        lead: "Data Cleaning:",
                        text: "Standardising counterparty names and transaction codes.",
                    },
                ],
            },
            Card {
                icon: "⚙️",
                title: "Process Automation (Power Automate)",
                bullets: vec![
                    Bullet {
                        lead: "RPA for Back Office:",
                        text: "Automating daily liquidity reporting.",
                    },
                    Bullet {
                        lead: "Workflow Design:",
                        text: "Approval flows for payments and guarantees.",
                    },
                ],
            },
            Card {
                icon: "🏦",
                title: "Treasury Management Systems",
                bullets: vec![
                    Bullet {
                        lead: "XML Imports:",
                        text: "Building TMS import files straight from Excel.",
                    },
                    Bullet {
                        lead: "Reporting:",
                        text: "Extracting positions for Power BI dashboards.",
                    },
                ],
            },
        ],
        contact_heading: "Ready to Transform Your Treasury Role?",
        contact_blurb: "Have specific questions about Power Platform implementation? Reach out to schedule a consultation.",
        name_field: NAME_FIELD,
        email_field: EMAIL_FIELD,
        message_field: FormField {
            label: "Your Automation Question",
            placeholder: "I need help automating my monthly debt schedule...",
        },
        submit_label: "Request Consultation",
        footer: "A Treasury Resource (2025)",
    }
}

fn third_revision() -> SiteContent {
    SiteContent {
        page_title: "Treasury Transformation: Data Science for the Treasury Professional",
        page_icon: "🤖",
        brand_image: brand_image(Revision::Third, "TreasuryC"),
        nav_title: "Navigation",
        learning_paths: LEARNING_PATHS,
        resources: RESOURCES,
        header: "Treasury Transformation: Data Efficiency and the Power Platform",
        mission_heading: "Empowering Treasury Teams through Data Mastery and Automation",
        mission_body: "This platform is dedicated to teaching front and back office professionals \
                       how to leverage tools like the Power Platforms, Excel and the TMS to eliminate manual work, \
                       accelerate financial closings, and enhance decision-making.",
        cta_label: "Start Your Treasury Journey",
        hero_image: hero_image(),
        image_placement: ImagePlacement::Right,
        paths_heading: "Key Learning Paths for Treasury Professionals",
        cards: [
            Card {
                icon: "🐍",
                title: "Data Manipulation & Cleanup",
                bullets: vec![
                    Bullet {
                        lead: "Advanced Excel:",
                        text: "Using Power Query for dynamic data ingestion and transformation.",
                    },
                    Bullet {
                        lead: "Data Cleaning:",
                        text: "Standardizing counterparty names and transaction codes.",
                    },
                ],
            },
            Card {
                icon: "⚙️",
                title: "Process Automation (Power Automate)",
                bullets: vec![
                    Bullet {
                        lead: "RPA for Back Office:",
                        text: "Automating daily liquidity reporting and TMS data entry.",
                    },
                    Bullet {
                        lead: "Workflow Design:",
                        text: "Building approval flows for payments and guarantee requests.",
                    },
                    Bullet {
                        lead: "Email Handling:",
                        text: "Automatically extracting payment confirmations and saving them to SharePoint.",
                    },
                ],
            },
            Card {
                icon: "📊",
                title: "Insightful Reporting (Power BI)",
                bullets: vec![
                    Bullet {
                        lead: "Dashboard Design:",
                        text: "Creating intuitive, drill-down dashboards for cash visibility.",
                    },
                    Bullet {
                        lead: "DAX Measures:",
                        text: "Implementing custom measures for calculating WACC, VaR, and covenant ratios.",
                    },
                    Bullet {
                        lead: "Executive Summaries:",
                        text: "Presenting complex risk metrics clearly to management.",
                    },
                ],
            },
        ],
        contact_heading: "Ready to Transform Your Treasury Role?",
        contact_blurb: "Have specific questions about Power Platform implementation or data governance? \
                        Reach out to schedule a consultation.",
        name_field: NAME_FIELD,
        email_field: EMAIL_FIELD,
        message_field: FormField {
            label: "Your Specific Automation/Data Query",
            placeholder: "I need help automating my monthly debt schedule...",
        },
        submit_label: "Request Consultation",
        footer: "A Treasury Resource (2025) | Powered by Rust",
    }
}
