//! Light entity: a switchable light with a power level that ramps up while observed.
//!
//! | Key     | Type   | PUT |
//! |---------|--------|-----|
//! | `state` | bool   | yes |
//! | `power` | int    | yes, must be >= 0 |
//! | `name`  | string | yes |
//!
//! A POST carrying none of these keys creates a child light at `{uri}/{n}`
//! when the light allows children; otherwise POST behaves like PUT.

use super::error::LightError;
use crate::framework::{PostOutcome, ResourceEntity};
use crate::model::Representation;
use async_trait::async_trait;

pub const STATE: &str = "state";
pub const POWER: &str = "power";
pub const NAME: &str = "name";

/// Power added on every notification tick. The ramp stops at `i64::MAX`.
pub const POWER_STEP: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    uri: String,
    pub state: bool,
    pub power: i64,
    pub name: String,
    allow_children: bool,
    children: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightCreate {
    pub name: String,
    pub power: i64,
    pub allow_children: bool,
}

impl Default for LightCreate {
    fn default() -> Self {
        Self {
            name: "light".to_string(),
            power: 0,
            allow_children: true,
        }
    }
}

impl LightCreate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Light {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn children(&self) -> u32 {
        self.children
    }
}

#[async_trait]
impl ResourceEntity for Light {
    type Create = LightCreate;
    type Error = LightError;
    const RESOURCE_TYPE: &'static str = "core.light";
    const INTERFACE: &'static str = "oic.if.rw";

    fn from_create_params(uri: &str, params: LightCreate) -> Result<Self, Self::Error> {
        if params.power < 0 {
            return Err(LightError::NegativePower(params.power));
        }
        Ok(Self {
            uri: uri.to_string(),
            state: false,
            power: params.power,
            name: params.name,
            allow_children: params.allow_children,
            children: 0,
        })
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(STATE, self.state)
            .with(POWER, self.power)
            .with(NAME, self.name.as_str())
    }

    async fn on_put(&mut self, representation: &Representation) -> Result<(), Self::Error> {
        // Read everything first so a bad key leaves the light untouched.
        let state = representation.opt_bool(STATE)?;
        let power = representation.opt_int(POWER)?;
        let name = representation.opt_str(NAME)?;

        if let Some(power) = power {
            if power < 0 {
                return Err(LightError::NegativePower(power));
            }
            self.power = power;
        }
        if let Some(state) = state {
            self.state = state;
        }
        if let Some(name) = name {
            self.name = name.to_string();
        }
        Ok(())
    }

    async fn on_post(
        &mut self,
        representation: &Representation,
    ) -> Result<PostOutcome<LightCreate>, Self::Error> {
        if !self.allow_children || representation.contains_any(&[STATE, POWER, NAME]) {
            self.on_put(representation).await?;
            return Ok(PostOutcome::Updated);
        }

        self.children += 1;
        Ok(PostOutcome::CreateChild {
            uri: format!("{}/{}", self.uri, self.children),
            params: LightCreate {
                name: format!("{} {}", self.name, self.children),
                power: 0,
                allow_children: false,
            },
        })
    }

    fn on_tick(&mut self) -> Result<(), Self::Error> {
        self.power = self.power.saturating_add(POWER_STEP);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeError;

    fn light() -> Light {
        Light::from_create_params("/a/light", LightCreate::named("kitchen")).unwrap()
    }

    #[test]
    fn test_defaults() {
        let representation = light().representation();
        assert_eq!(representation.get_bool(STATE), Ok(false));
        assert_eq!(representation.get_int(POWER), Ok(0));
        assert_eq!(representation.get_str(NAME), Ok("kitchen"));
        assert_eq!(representation.len(), 3);
    }

    #[tokio::test]
    async fn test_put_is_partial() {
        let mut light = light();
        light
            .on_put(&Representation::new().with(POWER, 40).with("unknown", 1))
            .await
            .unwrap();
        assert_eq!(light.power, 40);
        assert!(!light.state);
        assert_eq!(light.name, "kitchen");
    }

    #[tokio::test]
    async fn test_bad_put_changes_nothing() {
        let mut light = light();
        let err = light
            .on_put(&Representation::new().with(STATE, true).with(POWER, "high"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LightError::Attribute(AttributeError::TypeMismatch { .. })
        ));
        assert!(!light.state);

        let err = light
            .on_put(&Representation::new().with(STATE, true).with(POWER, -5))
            .await
            .unwrap_err();
        assert_eq!(err, LightError::NegativePower(-5));
        assert!(!light.state);
    }

    #[tokio::test]
    async fn test_post_creates_numbered_children() {
        let mut light = light();
        let first = light.on_post(&Representation::new()).await.unwrap();
        let second = light.on_post(&Representation::new()).await.unwrap();

        match (first, second) {
            (
                PostOutcome::CreateChild { uri: a, params: pa },
                PostOutcome::CreateChild { uri: b, .. },
            ) => {
                assert_eq!(a, "/a/light/1");
                assert_eq!(b, "/a/light/2");
                assert!(!pa.allow_children);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_with_attributes_updates() {
        let mut light = light();
        let outcome = light
            .on_post(&Representation::new().with(STATE, true))
            .await
            .unwrap();
        assert_eq!(outcome, PostOutcome::Updated);
        assert!(light.state);
        assert_eq!(light.children(), 0);
    }

    #[test]
    fn test_tick_ramps_power() {
        let mut light = light();
        light.on_tick().unwrap();
        light.on_tick().unwrap();
        assert_eq!(light.power, 2 * POWER_STEP);
    }

    #[tokio::test]
    async fn test_tick_at_max_power_stays_put() {
        let mut light = light();
        light
            .on_put(&Representation::new().with(POWER, i64::MAX))
            .await
            .unwrap();
        light.on_tick().unwrap();
        light.on_tick().unwrap();
        assert_eq!(light.power, i64::MAX);
    }
}
