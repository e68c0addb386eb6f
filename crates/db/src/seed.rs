//! Sample dataset served in demo mode and when the database is unreachable.

use std::collections::BTreeSet;

use studio_core::catalog::{CatalogItem, CatalogKind};
use studio_core::lifecycle::ProjectStage;
use studio_core::project::{ClientSummary, NewProject, Project};

fn project(id: &str, name: &str, client: &str, stage: ProjectStage) -> Project {
    let input = NewProject {
        name: name.to_string(),
        description: None,
        project_type: Some("residential".to_string()),
        location: None,
        budget: None,
        square_footage: None,
        timeline: None,
        notes: None,
        client_id: Some(format!("client-{id}")),
    };
    let mut project = Project::from_new(format!("proj-{id}"), &input, chrono::Utc::now());
    project.stage = stage;
    project.client = Some(ClientSummary {
        name: client.to_string(),
    });
    project
}

/// One project per pipeline stage, each with the flags its stage implies.
pub fn demo_projects() -> Vec<Project> {
    let now = chrono::Utc::now();

    let mut inquiry = project("1", "Lakeside Cabin", "Maya Chen", ProjectStage::Inquiry);
    inquiry.description = Some("Two-bedroom timber cabin on a sloped lot".to_string());
    inquiry.location = Some("Lake Placid, NY".to_string());
    inquiry.budget = Some("$420,000".to_string());
    inquiry.square_footage = Some(1400);
    inquiry.timeline = Some("12 months".to_string());

    let mut proposal = project("2", "Harbor Street Offices", "Northwind Partners", ProjectStage::Proposal);
    proposal.project_type = Some("commercial".to_string());
    proposal.location = Some("Portland, ME".to_string());
    proposal.square_footage = Some(9200);
    proposal.consultation_completed = true;
    proposal.consultation_completed_date = Some(now);

    let mut bidding = project("3", "Garden Courtyard House", "Luis Ortega", ProjectStage::Bidding);
    bidding.location = Some("Santa Fe, NM".to_string());
    bidding.budget = Some("$1.2M".to_string());
    bidding.consultation_completed = true;
    bidding.consultation_completed_date = Some(now);
    bidding.proposal_accepted = true;
    bidding.proposal_accepted_date = Some(now);
    bidding.proposal_sent_date = Some(now);

    let mut active = project("4", "Riverside Library Annex", "City of Dalton", ProjectStage::Active);
    active.project_type = Some("civic".to_string());
    active.consultation_completed = true;
    active.consultation_completed_date = Some(now);
    active.proposal_accepted = true;
    active.proposal_accepted_date = Some(now);
    active.proposal_sent_date = Some(now);
    active.proposal_signed = true;
    active.proposal_signed_date = Some(now);
    active.payment_received = true;
    active.payment_received_date = Some(now);

    vec![inquiry, proposal, bidding, active]
}

struct ItemSpec<'a> {
    id: &'a str,
    kind: CatalogKind,
    name: &'a str,
    description: &'a str,
    climate: &'a str,
    style: &'a str,
    building_type: &'a str,
    continent: &'a str,
    country: &'a str,
    tags: &'a [&'a str],
    year: i32,
    approved: bool,
}

impl ItemSpec<'_> {
    fn build(&self) -> CatalogItem {
        CatalogItem {
            id: self.id.to_string(),
            kind: self.kind,
            name: self.name.to_string(),
            description: self.description.to_string(),
            climate: self.climate.to_string(),
            style: self.style.to_string(),
            building_type: self.building_type.to_string(),
            continent: self.continent.to_string(),
            country: self.country.to_string(),
            tags: self.tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            year: self.year,
            approved: self.approved,
            image_url: None,
        }
    }
}

/// Showcase and portfolio pieces, including one awaiting approval.
pub fn demo_catalog() -> Vec<CatalogItem> {
    use CatalogKind::{Portfolio, Showcase};

    let specs = [
        ItemSpec {
            id: "cat-1",
            kind: Showcase,
            name: "Fjord House",
            description: "Cantilevered timber home above a Norwegian fjord",
            climate: "Cold",
            style: "Modern",
            building_type: "Residential",
            continent: "Europe",
            country: "Norway",
            tags: &["timber", "cantilever"],
            year: 2019,
            approved: true,
        },
        ItemSpec {
            id: "cat-2",
            kind: Showcase,
            name: "Desert Courtyard",
            description: "Rammed earth house arranged around a shaded court",
            climate: "Arid",
            style: "Vernacular",
            building_type: "Residential",
            continent: "Africa",
            country: "Morocco",
            tags: &["rammed earth", "passive cooling"],
            year: 2021,
            approved: true,
        },
        ItemSpec {
            id: "cat-3",
            kind: Showcase,
            name: "Canopy Library",
            description: "Public library under a perforated concrete canopy",
            climate: "Tropical",
            style: "Brutalist",
            building_type: "Civic",
            continent: "Asia",
            country: "Singapore",
            tags: &["concrete", "public"],
            year: 2016,
            approved: true,
        },
        ItemSpec {
            id: "cat-4",
            kind: Showcase,
            name: "White Pavilion",
            description: "Minimal glass pavilion for a sculpture garden",
            climate: "Temperate",
            style: "Minimalist",
            building_type: "Cultural",
            continent: "Asia",
            country: "Japan",
            tags: &["glass", "garden"],
            year: 2012,
            approved: true,
        },
        ItemSpec {
            id: "cat-5",
            kind: Showcase,
            name: "Prairie Barn Studio",
            description: "Converted barn with a new steel mezzanine",
            climate: "Continental",
            style: "Industrial",
            building_type: "Commercial",
            continent: "North America",
            country: "United States",
            tags: &["adaptive reuse", "steel"],
            year: 2018,
            approved: false,
        },
        ItemSpec {
            id: "port-1",
            kind: Portfolio,
            name: "Riverside Library Annex",
            description: "Two-storey reading room extension with river views",
            climate: "Temperate",
            style: "Modern",
            building_type: "Civic",
            continent: "North America",
            country: "United States",
            tags: &["public", "timber"],
            year: 2023,
            approved: true,
        },
        ItemSpec {
            id: "port-2",
            kind: Portfolio,
            name: "Hillside Residence",
            description: "Three-level house stepping down a wooded slope",
            climate: "Temperate",
            style: "Contemporary",
            building_type: "Residential",
            continent: "North America",
            country: "United States",
            tags: &["timber", "slope"],
            year: 2022,
            approved: true,
        },
    ];

    specs.iter().map(ItemSpec::build).collect()
}
