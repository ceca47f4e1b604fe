//! Backend commands queued from UI to backend worker.

use client_core::{Effect, RequestTicket};
use shared::domain::{GeoPoint, PlaceId};

use crate::map::TileId;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    FetchNext {
        ticket: RequestTicket,
    },
    SubmitCorrection {
        ticket: RequestTicket,
        place_id: PlaceId,
        location: GeoPoint,
    },
    FetchTile {
        tile: TileId,
    },
}

impl BackendCommand {
    /// Network command for a workflow effect. Notifications stay on the UI side.
    pub fn from_effect(effect: Effect) -> Option<Self> {
        match effect {
            Effect::FetchNext { ticket } => Some(BackendCommand::FetchNext { ticket }),
            Effect::SubmitCorrection {
                ticket,
                place_id,
                location,
            } => Some(BackendCommand::SubmitCorrection {
                ticket,
                place_id,
                location,
            }),
            Effect::Notify(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::FetchNext { .. } => "fetch_next",
            BackendCommand::SubmitCorrection { .. } => "submit_correction",
            BackendCommand::FetchTile { .. } => "fetch_tile",
        }
    }
}
