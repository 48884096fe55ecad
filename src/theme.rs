//! Colour palettes and the generated page stylesheet.
//!
//! Each page revision ships its own `Palette`; `stylesheet` turns it into the
//! inline CSS emitted at the top of every render.

/// Colours and font stack for one revision of the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// CSS `font-family` value for the whole document.
    pub font_family: &'static str,
    /// Body text.
    pub text: &'static str,
    /// Page background.
    pub background: &'static str,
    /// Main header colour.
    pub heading: &'static str,
    /// Section titles, their underline, and primary buttons.
    pub section: &'static str,
    /// Primary button hover.
    pub section_hover: &'static str,
    /// Left border of the learning path cards.
    pub accent: &'static str,
    /// Sidebar background.
    pub sidebar: &'static str,
    /// Divider rule.
    pub divider: &'static str,
}

impl Palette {
    /// Hex code without the leading `#`, as placeholder image services expect.
    pub fn heading_hex(&self) -> &'static str {
        self.heading.trim_start_matches('#')
    }
}

/// Render the page stylesheet for `palette`.
pub fn stylesheet(palette: &Palette) -> String {
    format!(
        r#"
html, body {{
    font-family: {font};
    color: {text};
    margin: 0;
}}
body {{
    background-color: {background};
    display: flex;
    min-height: 100vh;
}}
h1 {{
    color: {heading};
    font-weight: 800;
    font-size: 2.5em;
    padding-bottom: 10px;
}}
h3 {{
    color: {section};
    border-bottom: 3px solid {section};
    padding-bottom: 8px;
    margin-top: 40px;
    margin-bottom: 25px;
    font-weight: 700;
}}
.sidebar {{
    background-color: {sidebar};
    width: 260px;
    padding: 24px;
    box-sizing: border-box;
}}
.sidebar a {{
    color: {heading};
}}
main {{
    flex: 1;
    padding: 32px 48px;
}}
.hero {{
    display: flex;
    gap: 32px;
    align-items: flex-start;
}}
.hero.image-left {{
    flex-direction: row-reverse;
}}
.hero-text {{
    flex: 3;
}}
.hero-image {{
    flex: 1;
}}
.cards {{
    display: flex;
    gap: 24px;
}}
.card {{
    flex: 1;
    background-color: #ffffff;
    border-left: 5px solid {accent};
    border-radius: 8px;
    box-shadow: 2px 2px 10px rgba(0, 0, 0, 0.05);
    padding: 16px 20px;
}}
.divider {{
    border-top: 1px solid {divider};
    margin-top: 30px;
    margin-bottom: 30px;
}}
.btn {{
    background-color: {section};
    color: white;
    border: none;
    border-radius: 8px;
    padding: 10px 20px;
    font-weight: 600;
    cursor: pointer;
    transition: background-color 0.3s;
}}
.btn:hover {{
    background-color: {hover};
}}
.contact-form label {{
    display: block;
    margin-top: 12px;
}}
.contact-form input, .contact-form textarea {{
    width: 100%;
    padding: 8px;
    box-sizing: border-box;
}}
.ack {{
    background-color: #e8f5e9;
    border-left: 5px solid {section};
    border-radius: 8px;
    padding: 12px 16px;
    margin-top: 16px;
}}
"#,
        font = palette.font_family,
        text = palette.text,
        background = palette.background,
        heading = palette.heading,
        section = palette.section,
        hover = palette.section_hover,
        accent = palette.accent,
        sidebar = palette.sidebar,
        divider = palette.divider,
    )
}

