//! Server-rendered HTML for the landing page, the wizard and the dashboard.

use super::view::{
    CampaignsPage, CreativesPage, NO_CAMPAIGN_DATA, NO_CAMPAIGNS, NO_CREATIVES,
    NO_DASHBOARD_CREATIVES, NOT_AVAILABLE, PerformancePage,
};
use crate::wizard::model::{BusinessInfo, Creative, Offer};
use crate::wizard::session::SessionSnapshot;
use crate::wizard::steps::{BusinessInfoView, LaunchView, SelectionView, StepView};

pub const SITE_NAME: &str = "loca.ai";
pub const TAGLINE: &str = "AI-powered ads that actually work for local businesses.";

/// Sidebar entries: (href, label).
pub const NAV_ITEMS: [(&str, &str); 5] = [
    ("/dashboard", "Dashboard"),
    ("/campaigns", "Campaigns"),
    ("/creatives", "Creatives"),
    ("/billing", "Billing"),
    ("/settings", "Settings"),
];

/// Shortcut that reopens the wizard at street selection.
pub const NEW_CAMPAIGN_HREF: &str = "/?startStep=2";

/// Escape text for HTML element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n{head_extra}</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn site_header(progress: Option<(u8, u8)>) -> String {
    let mut html = format!("<header class=\"site-header\"><span class=\"brand\">{SITE_NAME}</span>");
    if let Some((step, total)) = progress {
        html.push_str(&format!(
            "<span class=\"wizard-progress\">Setup Wizard <strong>{step}/{total}</strong></span>"
        ));
    }
    html.push_str("</header>\n");
    html
}

/// Dashboard chrome: sidebar navigation plus a titled main area.
pub fn dashboard_layout(active: &str, page_title: &str, body: &str) -> String {
    let mut nav = String::new();
    for (href, label) in NAV_ITEMS {
        let class = if href == active { " class=\"active\"" } else { "" };
        nav.push_str(&format!("<a href=\"{href}\"{class}>{label}</a>\n"));
    }
    let page = format!(
        "<aside class=\"sidebar\"><div class=\"brand\">{SITE_NAME}</div>\n<nav>\n{nav}</nav>\n\
         <a class=\"button\" href=\"{NEW_CAMPAIGN_HREF}\">New campaign</a>\n\
         <div class=\"help\">Help and feedback</div></aside>\n\
         <div class=\"content\"><header><h1>{}</h1></header>\n<main>\n{body}</main></div>\n",
        escape(page_title)
    );
    document(&format!("{page_title} | {SITE_NAME}"), "", &page)
}

fn empty_state(text: &str) -> String {
    format!("<p class=\"empty\">{}</p>\n", escape(text))
}

pub fn render_landing() -> String {
    let body = format!(
        "{}<section class=\"hero\">\n<h1>Stop Wasting Money on Social Media Marketing</h1>\n\
         <p>{TAGLINE}</p>\n\
         <p>Our AI creates and manages advertisements for your local business. \
         Get more customers from your neighborhood without the guesswork or high costs.</p>\n\
         <a class=\"button\" href=\"/?startStep=1\">Demo</a>\n</section>\n",
        site_header(None)
    );
    document(&format!("{SITE_NAME} | {TAGLINE}"), "", &body)
}

pub fn render_campaigns(page: &CampaignsPage) -> String {
    let mut body = format!(
        "<section class=\"card\"><h2>Your Campaigns</h2>\n<p>{}</p>\n",
        escape(&page.description())
    );
    if page.rows.is_empty() {
        body.push_str(&empty_state(NO_CAMPAIGNS));
    } else {
        body.push_str("<table>\n<thead><tr>");
        for column in CampaignsPage::COLUMNS {
            body.push_str(&format!("<th>{}</th>", escape(column)));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        for row in &page.rows {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&row.title),
                escape(&row.offer_type),
                escape(&row.description)
            ));
        }
        body.push_str("</tbody>\n</table>\n");
    }
    body.push_str("</section>\n");
    dashboard_layout("/campaigns", "Campaigns", &body)
}

pub fn render_creatives(page: &CreativesPage) -> String {
    let mut body = format!(
        "<section class=\"card\"><h2>Your Ad Creatives</h2>\n<p>{}</p>\n",
        escape(&page.description())
    );
    if page.cards.is_empty() {
        body.push_str(&empty_state(NO_CREATIVES));
    } else {
        body.push_str("<div class=\"grid\">\n");
        for card in &page.cards {
            body.push_str(&format!(
                "<article class=\"creative\"><h3>{}</h3>\
                 <span class=\"badge\">{}</span><span class=\"badge\">{}</span>\
                 <p>{}</p></article>\n",
                escape(&card.headline),
                escape(&card.target_street),
                escape(&card.offer),
                escape(&card.description)
            ));
        }
        body.push_str("</div>\n");
    }
    body.push_str("</section>\n");
    dashboard_layout("/creatives", "Creatives", &body)
}

pub fn render_dashboard(page: &PerformancePage) -> String {
    let mut body = String::from(
        "<section class=\"banner\"><h3>Your campaigns are live!</h3>\n\
         <p>Performance data may take up to 24 hours to populate. Please check back soon.</p>\
         </section>\n<div class=\"stats\">\n",
    );
    for (label, value) in page.stats {
        body.push_str(&format!(
            "<div class=\"stat\"><h4>{label}</h4><div class=\"value\">{value}</div></div>\n"
        ));
    }
    body.push_str("</div>\n<section class=\"card\"><h2>Campaign Breakdown</h2>\n");
    if page.campaigns.is_empty() {
        body.push_str(&empty_state(NO_CAMPAIGN_DATA));
    } else {
        body.push_str("<table>\n<thead><tr>");
        for column in PerformancePage::BREAKDOWN_COLUMNS {
            body.push_str(&format!("<th>{column}</th>"));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        let metrics = format!("<td>{NOT_AVAILABLE}</td>").repeat(6);
        for name in &page.campaigns {
            body.push_str(&format!("<tr><td>{}</td>{metrics}</tr>\n", escape(name)));
        }
        body.push_str("</tbody>\n</table>\n");
    }
    body.push_str("</section>\n<section class=\"card\"><h2>Your Ad Creatives</h2>\n");
    if page.gallery.is_empty() {
        body.push_str(&empty_state(NO_DASHBOARD_CREATIVES));
        body.push_str(
            "<p class=\"hint\">Complete the setup wizard to generate your first set of ads.</p>\n",
        );
    } else {
        body.push_str("<div class=\"grid\">\n");
        for item in &page.gallery {
            body.push_str(&format!(
                "<article class=\"creative\"><img src=\"{}\" alt=\"Ad creative for {}\">\
                 <div class=\"street\">Ad for {}</div><h3>{}</h3><p>{}</p></article>\n",
                escape(&item.image_url),
                escape(&item.street),
                escape(&item.street),
                escape(&item.headline),
                escape(&item.body)
            ));
        }
        body.push_str("</div>\n");
    }
    body.push_str("</section>\n");
    dashboard_layout("/dashboard", &page.title(), &body)
}

// ── Wizard ──────────────────────────────────────────────────────────────

fn post_button(action: &str, label: &str, hidden: &[(&str, &str)], enabled: bool) -> String {
    let mut html = format!("<form method=\"post\" action=\"{}\">", escape(action));
    for (name, value) in hidden {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"{name}\" value=\"{}\">",
            escape(value)
        ));
    }
    let disabled = if enabled { "" } else { " disabled" };
    html.push_str(&format!("<button type=\"submit\"{disabled}>{label}</button></form>\n"));
    html
}

/// Render an active wizard session. `errors` are shown above the step.
pub fn render_wizard(snapshot: &SessionSnapshot, errors: &[String]) -> String {
    let base = format!("/wizard/{}", snapshot.session_id);
    let mut body = site_header(Some((snapshot.step, snapshot.total_steps)));
    body.push_str(&format!(
        "<main class=\"wizard\">\n<div class=\"progress\" style=\"width:{}%\"></div>\n<h1>{}</h1>\n",
        snapshot.progress_percent,
        escape(snapshot.title)
    ));

    if !errors.is_empty() {
        body.push_str("<ul class=\"errors\">\n");
        for error in errors {
            body.push_str(&format!("<li>{}</li>\n", escape(error)));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&post_button(&format!("{base}/back"), "Back", &[], snapshot.can_go_back));

    let mut refresh = snapshot.loading;
    match &snapshot.view {
        Some(StepView::BusinessInfo(view)) => body.push_str(&business_form(&base, view)),
        Some(StepView::StreetSelection(view)) => {
            body.push_str(&selection(&base, view, |street: &String| {
                (street.clone(), escape(street))
            }));
        }
        Some(StepView::OfferGeneration(view)) => {
            body.push_str(&selection(&base, view, offer_item));
            if !view.loading {
                body.push_str(&post_button(
                    &format!("{base}/regenerate"),
                    "Regenerate Offers",
                    &[],
                    true,
                ));
            }
        }
        Some(StepView::CreativeGeneration(view)) => {
            body.push_str(&selection(&base, view, creative_item));
        }
        Some(StepView::CampaignLaunch(view)) => {
            refresh |= !view.complete;
            body.push_str(&launch(&base, view));
        }
        None => {}
    }
    body.push_str("</main>\n");

    let head = if refresh {
        "<meta http-equiv=\"refresh\" content=\"1\">\n"
    } else {
        ""
    };
    document(&format!("{} | {SITE_NAME}", snapshot.title), head, &body)
}

fn text_input(name: &str, label: &str, value: &str, extra: &str) -> String {
    format!(
        "<label>{label} <input name=\"{name}\" value=\"{}\"{extra}></label>\n",
        escape(value)
    )
}

fn business_form(base: &str, view: &BusinessInfoView) -> String {
    let prefill = view.prefill.clone().unwrap_or_else(BusinessInfo::default);
    let mut html = format!("<form method=\"post\" action=\"{}/next\">\n", escape(base));
    html.push_str(&text_input("businessName", "Business Name", &prefill.business_name, " required"));

    html.push_str("<label>Business Type <select name=\"businessType\" required>\n");
    let selected_type = view.prefill.as_ref().map(|p| p.business_type.to_string());
    html.push_str("<option value=\"\">Select a type</option>\n");
    for option in &view.business_types {
        let selected = if selected_type.as_deref() == Some(option.value.as_str()) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>\n",
            escape(&option.value),
            escape(option.label)
        ));
    }
    html.push_str("</select></label>\n");

    html.push_str(&format!(
        "<label>Description <textarea name=\"description\">{}</textarea></label>\n",
        escape(&prefill.description)
    ));
    html.push_str(&text_input("streetNumber", "Street Number", &prefill.street_number, " required"));
    html.push_str(&text_input("streetName", "Street Name", &prefill.street_name, " required"));
    html.push_str(&text_input("city", "City", &prefill.city, " list=\"cities\" required"));
    html.push_str("<datalist id=\"cities\">");
    for city in view.cities {
        html.push_str(&format!("<option value=\"{}\">", escape(city)));
    }
    html.push_str("</datalist>\n");

    html.push_str("<label>Province <select name=\"province\" required>\n");
    html.push_str("<option value=\"\">Select a province</option>\n");
    for province in view.provinces {
        let selected = if prefill.province == *province { " selected" } else { "" };
        html.push_str(&format!(
            "<option{selected}>{}</option>\n",
            escape(province)
        ));
    }
    html.push_str("</select></label>\n");

    html.push_str(&text_input("postalCode", "Postal Code", &prefill.postal_code, " required"));
    html.push_str(&text_input("website", "Website", &prefill.website, ""));
    html.push_str(&text_input("phone", "Phone", &prefill.phone, ""));
    let max_discount = prefill
        .max_discount_percentage
        .map(|p| p.to_string())
        .unwrap_or_default();
    html.push_str(&text_input(
        "maxDiscountPercentage",
        "Maximum Discount (%)",
        &max_discount,
        " type=\"number\" min=\"0\" max=\"100\"",
    ));
    html.push_str("<button type=\"submit\">Next</button>\n</form>\n");
    html
}

fn offer_item(offer: &Offer) -> (String, String) {
    (
        offer.id.clone(),
        format!(
            "<strong>{}</strong><p>{}</p><p class=\"hint\">{}</p>",
            escape(&offer.title),
            escape(&offer.description),
            escape(&offer.reasoning)
        ),
    )
}

fn creative_item(creative: &Creative) -> (String, String) {
    (
        creative.id.clone(),
        format!(
            "<strong>{}</strong><p>{}</p><span class=\"badge\">{}</span>\
             <span class=\"badge\">{}</span><span class=\"cta\">{}</span>",
            escape(&creative.headline),
            escape(&creative.description),
            escape(&creative.target_street),
            escape(&creative.offer),
            escape(&creative.call_to_action)
        ),
    )
}

/// A toggle list. `describe` yields the item's key and its HTML label.
fn selection<T>(
    base: &str,
    view: &SelectionView<T>,
    describe: impl Fn(&T) -> (String, String),
) -> String {
    if view.loading {
        return "<p class=\"loading\">Loading...</p>\n".to_string();
    }
    let mut html = String::new();
    if view.items.is_empty() {
        html.push_str(&empty_state("Nothing was found. Go back and try again."));
    } else {
        html.push_str("<ul class=\"selection\">\n");
        for entry in &view.items {
            let (key, label) = describe(&entry.item);
            let (class, action) = if entry.selected {
                (" class=\"selected\"", "Deselect")
            } else {
                ("", "Select")
            };
            html.push_str(&format!("<li{class}>{label}"));
            html.push_str(&post_button(
                &format!("{base}/toggle"),
                action,
                &[("item", key.as_str())],
                true,
            ));
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n");
    }
    html.push_str(&format!("<p>{} selected</p>\n", view.selected_count));
    html.push_str(&post_button(&format!("{base}/next"), "Next", &[], view.can_confirm));
    html
}

fn launch(base: &str, view: &LaunchView) -> String {
    let summary = &view.summary;
    let mut html = format!(
        "<section class=\"summary\"><h2>{}</h2>\n<ul><li>{} target streets</li>\
         <li>{} offers</li><li>{} ad creatives</li></ul></section>\n",
        escape(&summary.business_name),
        summary.streets,
        summary.offers,
        summary.creatives
    );
    html.push_str(&format!(
        "<div class=\"launch-progress\">{:.0}%</div>\n<ol class=\"checklist\">\n",
        view.progress
    ));
    for (i, item) in view.items.iter().enumerate() {
        let state = if view.complete || i < view.current_item {
            "done"
        } else if i == view.current_item {
            "active"
        } else {
            "pending"
        };
        html.push_str(&format!("<li class=\"{state}\">{item}</li>\n"));
    }
    html.push_str("</ol>\n");
    if view.complete {
        html.push_str("<p>Your campaigns are live!</p>\n");
    }
    html.push_str(&post_button(
        &format!("{base}/next"),
        "View Dashboard",
        &[],
        view.complete,
    ));
    html
}
