//! Static lexical pools the simulator draws from.
//!
//! Companies, analysts, polarity-tagged sentence templates, filler vocabulary,
//! and the scripted market context (events and prior-quarter statements) used
//! by the discrepancy rules. Pure data, no behavior beyond lookups.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Tone a synthesized sentence must express.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
    AnalystQuestion,
}

impl Polarity {
    /// Sentiment impulse fed to the momentum process.
    pub fn impulse(self) -> i8 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
            Polarity::Neutral | Polarity::AnalystQuestion => 0,
        }
    }

    pub fn templates(self) -> &'static [&'static str] {
        match self {
            Polarity::Positive => POSITIVE_TEMPLATES,
            Polarity::Negative => NEGATIVE_TEMPLATES,
            Polarity::Neutral => NEUTRAL_TEMPLATES,
            Polarity::AnalystQuestion => QUESTION_TEMPLATES,
        }
    }

    pub fn adjectives(self) -> &'static [&'static str] {
        match self {
            Polarity::Positive => POSITIVE_ADJECTIVES,
            Polarity::Negative => NEGATIVE_ADJECTIVES,
            Polarity::Neutral | Polarity::AnalystQuestion => NEUTRAL_ADJECTIVES,
        }
    }
}

/// A company the simulated call can be about.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub ceo: String,
    pub cfo: String,
    /// Product and topic names substituted into templates
    pub products: Vec<String>,
}

struct CompanySeed {
    ticker: &'static str,
    name: &'static str,
    sector: &'static str,
    ceo: &'static str,
    cfo: &'static str,
    products: &'static [&'static str],
}

impl CompanySeed {
    fn to_company(&self) -> Company {
        Company {
            ticker: self.ticker.to_string(),
            name: self.name.to_string(),
            sector: self.sector.to_string(),
            ceo: self.ceo.to_string(),
            cfo: self.cfo.to_string(),
            products: self.products.iter().map(|p| p.to_string()).collect(),
        }
    }
}

const COMPANIES: &[CompanySeed] = &[
    CompanySeed { ticker: "NVDA", name: "NVIDIA", sector: "Tech", ceo: "Jensen Huang", cfo: "Colette Kress", products: &["H100 GPUs", "Blackwell Platform", "Data Center Revenue", "Gaming Segment", "Sovereign AI"] },
    CompanySeed { ticker: "AAPL", name: "Apple", sector: "Tech", ceo: "Tim Cook", cfo: "Luca Maestri", products: &["iPhone 16 Pro", "Services Ecosystem", "Vision Pro", "MacBook Air", "iPad Pro"] },
    CompanySeed { ticker: "MSFT", name: "Microsoft", sector: "Tech", ceo: "Satya Nadella", cfo: "Amy Hood", products: &["Azure AI", "Microsoft 365 Copilot", "Intelligent Cloud", "Windows OEM", "GitHub Copilot"] },
    CompanySeed { ticker: "GOOGL", name: "Alphabet", sector: "Tech", ceo: "Sundar Pichai", cfo: "Ruth Porat", products: &["Google Cloud", "Search Ads", "YouTube Premium", "Gemini Ultra", "Pixel 9"] },
    CompanySeed { ticker: "AMZN", name: "Amazon", sector: "Consumer", ceo: "Andy Jassy", cfo: "Brian Olsavsky", products: &["AWS Compute", "Prime Memberships", "Advertising Services", "North America Retail", "Kuiper"] },
    CompanySeed { ticker: "META", name: "Meta", sector: "Tech", ceo: "Mark Zuckerberg", cfo: "Susan Li", products: &["Family of Apps", "Reels Monetization", "Llama 3", "Reality Labs", "Advantage+ Ads"] },
    CompanySeed { ticker: "AMD", name: "AMD", sector: "Tech", ceo: "Lisa Su", cfo: "Jean Hu", products: &["MI300X Accelerator", "Ryzen AI", "Data Center EPYC", "Client Computing"] },
    CompanySeed { ticker: "AVGO", name: "Broadcom", sector: "Tech", ceo: "Hock Tan", cfo: "Kirsten Spears", products: &["AI Networking", "VMware Integration", "Custom Silicon", "Broadband"] },
    CompanySeed { ticker: "TSLA", name: "Tesla", sector: "Auto", ceo: "Elon Musk", cfo: "Vaibhav Taneja", products: &["Model Y", "Cybertruck Production", "FSD Beta", "Energy Storage", "Optimus"] },
    CompanySeed { ticker: "INTC", name: "Intel", sector: "Tech", ceo: "Pat Gelsinger", cfo: "David Zinsner", products: &["Gaudi 3", "Intel Foundry", "Core Ultra", "Process Nodes"] },
    CompanySeed { ticker: "JPM", name: "JPMorgan", sector: "Finance", ceo: "Jamie Dimon", cfo: "Jeremy Barnum", products: &["Net Interest Income", "Investment Banking Fees", "Consumer Spending", "Markets Revenue", "Credit Costs"] },
    CompanySeed { ticker: "GS", name: "Goldman Sachs", sector: "Finance", ceo: "David Solomon", cfo: "Denis Coleman", products: &["Global Banking", "Asset & Wealth Management", "FICC Execution", "Equities Financing"] },
    CompanySeed { ticker: "MS", name: "Morgan Stanley", sector: "Finance", ceo: "Ted Pick", cfo: "Sharon Yeshaya", products: &["Wealth Management Net New Assets", "Institutional Securities", "Investment Management", "Advisory Fees"] },
    CompanySeed { ticker: "V", name: "Visa", sector: "Finance", ceo: "Ryan McInerney", cfo: "Chris Suh", products: &["Cross-Border Volume", "Payments Volume", "Value-Added Services", "New Flows"] },
    CompanySeed { ticker: "COST", name: "Costco", sector: "Retail", ceo: "Ron Vachris", cfo: "Gary Millerchip", products: &["Membership Fee Income", "Comparable Sales", "E-commerce", "Fresh Foods", "Gasoline"] },
    CompanySeed { ticker: "UNH", name: "UnitedHealth", sector: "Healthcare", ceo: "Andrew Witty", cfo: "John Rex", products: &["Optum Health", "Medicare Advantage", "Value-Based Care", "Medical Care Ratio"] },
    CompanySeed { ticker: "XOM", name: "ExxonMobil", sector: "Energy", ceo: "Darren Woods", cfo: "Kathy Mikells", products: &["Upstream Production", "Low Carbon Solutions", "Refining Margins", "Permian Basin", "Chemical Products"] },
    CompanySeed { ticker: "WMT", name: "Walmart", sector: "Retail", ceo: "Doug McMillon", cfo: "John David Rainey", products: &["US Comp Sales", "Walmart Connect", "Global eCommerce", "Sam's Club"] },
];

/// Sell-side analysts an analyst panel is drawn from.
pub const ANALYSTS: &[&str] = &[
    "Toshiya Hari (Goldman Sachs)",
    "Stacy Rasgon (Bernstein)",
    "Ross Seymore (Deutsche Bank)",
    "Vivek Arya (BofA)",
    "Joe Moore (Morgan Stanley)",
    "Timothy Arcuri (UBS)",
    "Atif Malik (Citi)",
    "Matt Ramsay (Cowen)",
    "Harlan Sur (JPMorgan)",
    "Ben Reitzes (Melius)",
    "Srini Pajjuri (Raymond James)",
    "Pierre Ferragu (New Street)",
    "C.J. Muse (Cantor Fitzgerald)",
    "Blayne Curtis (Jefferies)",
    "Aaron Rakers (Wells Fargo)",
];

/// Size of the analyst panel drawn per session.
pub const ANALYST_PANEL_SIZE: usize = 3;

// Every template carries at least one of `{product}` or `{number}`.

const POSITIVE_TEMPLATES: &[&str] = &[
    "We are seeing unprecedented demand for {product}, which drove revenue significantly above the high end of our guidance.",
    "Momentum in {product} accelerated throughout the quarter, and we are exiting with a record backlog.",
    "Our {product} business delivered its strongest performance to date, growing {number}% year-over-year.",
    "Customer adoption of {product} is inflecting faster than we anticipated.",
    "We achieved record gross margins this quarter, expanding by {number} basis points thanks to operational discipline.",
    "Our focus on efficiency is paying off, with operating income growing {number}% faster than revenue.",
    "We are seeing significant leverage in the model as {product} scales.",
    "Free cash flow generation was robust at ${number} billion, allowing us to return capital to shareholders.",
    "Based on the visibility we have into {product} demand, we are raising our full-year outlook.",
    "Demand for {product} remains {adjective}, and we are confident in the long-term trajectory.",
    "The pipeline for {product} has never been stronger entering a new fiscal year.",
];

const NEGATIVE_TEMPLATES: &[&str] = &[
    "We observed a sudden deceleration in {product} demand towards the end of the quarter.",
    "Macroeconomic uncertainty is causing customers to scrutinize spend, impacting our {product} segment.",
    "The recovery in {product} is taking longer than we initially expected.",
    "We are seeing some softness in the {product} market, particularly in specific geographies.",
    "Gross margins were impacted by {number} basis points due to higher component costs and mix shift.",
    "Supply chain constraints for {product} limited our ability to fully capture demand this period.",
    "We are facing FX headwinds that negatively impacted revenue by approximately {number}%.",
    "Pricing pressure in the {product} space remains a challenge we are actively navigating.",
    "Given the volatility in {product}, we are widening our guidance range for the upcoming quarter.",
    "Trends in {product} were {adjective}, so we are taking a prudent approach to the second half guide.",
];

const NEUTRAL_TEMPLATES: &[&str] = &[
    "Revenue of ${number} billion was in line with our expectations for the quarter.",
    "We continue to execute on our roadmap for {product} despite a mixed environment.",
    "Our inventory levels for {product} are now normalized and healthy.",
    "We are maintaining our capital expenditure forecast to support long-term growth in {product}.",
    "The {product} business performed consistently with seasonal norms.",
    "We are monitoring the regulatory landscape around {product} closely but see no immediate material impact.",
    "Our balance sheet remains a fortress, with ${number} billion in cash and marketable securities.",
    "Progress on our strategic priorities for {product} was {adjective} during the period.",
];

const QUESTION_TEMPLATES: &[&str] = &[
    "Can you provide more color on the linearity of {product} bookings during the quarter?",
    "How should we think about the exit rate for {product} margins going into next year?",
    "Are you seeing any competitive changes in pricing for {product}?",
    "Could you parse out how much of the growth in {product} was volume versus price?",
    "What are you assuming for the macro environment in your {product} guidance?",
    "Is the strength in {product} coming from new logos or expansion at existing customers?",
    "Can you update us on the supply chain lead times for {product}?",
    "How is the initial feedback for the new {product} launch tracking relative to internal expectations?",
    "Are there any one-time items we should be aware of in the {product} opex line?",
];

const POSITIVE_ADJECTIVES: &[&str] = &[
    "robust",
    "insatiable",
    "extraordinary",
    "accelerating",
    "durable",
    "broad-based",
    "secular",
    "record-breaking",
];

const NEGATIVE_ADJECTIVES: &[&str] = &[
    "muted",
    "transient",
    "persistent",
    "challenging",
    "uneven",
    "subdued",
    "volatile",
    "headwind-driven",
];

const NEUTRAL_ADJECTIVES: &[&str] = &["steady", "measured", "consistent", "seasonal", "on plan"];

/// Filler topics for `{topic}` placeholders.
pub const TOPICS: &[&str] = &[
    "Generative AI",
    "Cloud Optimization",
    "Supply Chain Resilience",
    "Capital Allocation",
    "Consumer Wallet Share",
    "Regulatory Compliance",
    "Margin Expansion",
    "Geopolitical Risk",
];

/// All simulated companies, in catalogue order.
pub fn companies() -> Vec<Company> {
    COMPANIES.iter().map(CompanySeed::to_company).collect()
}

/// Case-insensitive ticker lookup.
pub fn find_company(ticker: &str) -> Option<Company> {
    COMPANIES
        .iter()
        .find(|seed| seed.ticker.eq_ignore_ascii_case(ticker.trim()))
        .map(CompanySeed::to_company)
}

// ============================================================================
// Scripted market context
// ============================================================================

/// Scope of a market event.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MarketEventType {
    Macro,
    Sector,
    Company,
}

/// Coarse three-step scale shared by severities, impacts and confidences.
#[derive(
    Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Display,
)]
pub enum Level {
    #[default]
    Low,
    Medium,
    High,
}

/// External event a narrative shift can be attributed to.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarketEvent {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub event_type: MarketEventType,
    pub headline: String,
    pub impact_level: Level,
}

/// Events that happened between the prior quarter and the current call.
pub fn market_events() -> Vec<MarketEvent> {
    [
        ("1", "2024-09-15", MarketEventType::Sector, "US Dept of Commerce tightens AI chip export controls", Level::High),
        ("2", "2024-10-02", MarketEventType::Company, "Report: TSMC CoWoS packaging capacity delayed by 3 months", Level::Medium),
        ("3", "2024-10-10", MarketEventType::Macro, "10-Year Treasury Yield spikes to 4.5%", Level::Low),
        ("4", "2024-11-01", MarketEventType::Sector, "Competitor AMD announces margin compression in data center", Level::Medium),
    ]
    .into_iter()
    .map(|(id, date, event_type, headline, impact_level)| MarketEvent {
        id: id.to_string(),
        date: date.to_string(),
        event_type,
        headline: headline.to_string(),
        impact_level,
    })
    .collect()
}

/// What management said on the prior-quarter call.
pub mod prior_quarter {
    pub const MARGINS: &str = "We expect gross margins to remain stable at 75% throughout the fiscal year as supply chain costs have normalized.";
    pub const CHINA: &str = "Demand in China remains robust despite existing restrictions; we see no immediate impact on our guidance.";
    pub const SUPPLY: &str = "Our supply capacity for the H100 is fully unlocked and we are meeting all backlog orders.";
    pub const GUIDANCE: &str = "We are confident in sustaining 50% YoY growth through 2025.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_a_substitution_anchor() {
        for polarity in [
            Polarity::Positive,
            Polarity::Negative,
            Polarity::Neutral,
            Polarity::AnalystQuestion,
        ] {
            for template in polarity.templates() {
                assert!(
                    template.contains("{product}") || template.contains("{number}"),
                    "{polarity} template lacks anchor: {template}"
                );
            }
        }
    }

    #[test]
    fn test_company_catalogue_is_well_formed() {
        let companies = companies();
        assert!(companies.len() >= 10);
        for company in &companies {
            assert!(!company.products.is_empty(), "{} has no products", company.ticker);
            assert!(!company.ceo.is_empty() && !company.cfo.is_empty());
        }
        assert!(ANALYSTS.len() >= ANALYST_PANEL_SIZE);
    }

    #[test]
    fn test_find_company_is_case_insensitive() {
        let nvda = find_company(" nvda ").unwrap();
        assert_eq!(nvda.name, "NVIDIA");
        assert!(nvda.products.iter().any(|p| p == "H100 GPUs"));
        assert!(find_company("ZZZZ").is_none());
    }

    #[test]
    fn test_impulse_mapping() {
        assert_eq!(Polarity::Positive.impulse(), 1);
        assert_eq!(Polarity::Negative.impulse(), -1);
        assert_eq!(Polarity::Neutral.impulse(), 0);
        assert_eq!(Polarity::AnalystQuestion.impulse(), 0);
    }

    #[test]
    fn test_market_events_cover_rule_links() {
        let events = market_events();
        assert!(events.iter().any(|e| e.headline.contains("TSMC")));
        assert!(events.iter().any(|e| e.headline.contains("Export controls")
            || e.headline.contains("export controls")));
        assert_eq!(Level::High.max(Level::Low), Level::High);
    }
}
