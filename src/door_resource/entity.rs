//! Door entity. `side` is fixed at construction; only `state` can be written.

use super::error::DoorError;
use crate::framework::ResourceEntity;
use crate::model::Representation;
use async_trait::async_trait;

pub const STATE: &str = "state";
pub const SIDE: &str = "side";

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    side: String,
    pub state: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoorCreate {
    pub side: String,
}

impl DoorCreate {
    pub fn new(side: impl Into<String>) -> Self {
        Self { side: side.into() }
    }
}

impl Door {
    pub fn side(&self) -> &str {
        &self.side
    }
}

#[async_trait]
impl ResourceEntity for Door {
    type Create = DoorCreate;
    type Error = DoorError;
    const RESOURCE_TYPE: &'static str = "core.door";
    const INTERFACE: &'static str = "oic.if.rw";

    fn from_create_params(_uri: &str, params: DoorCreate) -> Result<Self, Self::Error> {
        if params.side.trim().is_empty() {
            return Err(DoorError::EmptySide);
        }
        Ok(Self {
            side: params.side,
            state: false,
        })
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(STATE, self.state)
            .with(SIDE, self.side.as_str())
    }

    /// A `side` key is accepted but ignored.
    async fn on_put(&mut self, representation: &Representation) -> Result<(), Self::Error> {
        if let Some(state) = representation.opt_bool(STATE)? {
            self.state = state;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_side_is_immutable() {
        let mut door = Door::from_create_params("/a/door/left", DoorCreate::new("left")).unwrap();
        door.on_put(&Representation::new().with(STATE, true).with(SIDE, "right"))
            .await
            .unwrap();

        assert_eq!(door.side(), "left");
        assert_eq!(
            door.representation(),
            Representation::new().with(STATE, true).with(SIDE, "left")
        );
    }

    #[test]
    fn test_rejects_blank_side() {
        assert_eq!(
            Door::from_create_params("/a/door", DoorCreate::new("  ")),
            Err(DoorError::EmptySide)
        );
    }
}
