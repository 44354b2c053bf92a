//! Sectors and the agencies operating in them.

mod agency;
mod sector;

pub use agency::{Agency, AgencyCriteria, AgencyDraft, AgencyPatch};
pub use sector::{Sector, SectorCriteria, SectorDraft, SectorPatch};
