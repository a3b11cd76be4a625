//! Integration tests for the device registry.

mod common;

use common::FakeLight;
use myrtio_hue_bridge::{
    ConfigurationError, DeviceId, DeviceRegistry, Error, HardwareError, LightCommand, LightState,
};

fn id(raw: u8) -> DeviceId {
    DeviceId::new(raw).expect("non-zero id")
}

// -----------------------------------------------------------------------------
// Registration
// -----------------------------------------------------------------------------

#[test]
fn ids_follow_registration_order() {
    let kitchen = FakeLight::default();
    let hall = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 4>::new();

    assert_eq!(registry.register("Kitchen", &kitchen), Ok(id(1)));
    assert_eq!(registry.register("Hall", &hall), Ok(id(2)));

    let names: Vec<_> = registry.list().map(|device| device.name()).collect();
    assert_eq!(names, ["Kitchen", "Hall"]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn duplicate_name_is_rejected_and_registry_unchanged() {
    let first = FakeLight::default();
    let second = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 4>::new();
    registry.register("Kitchen", &first).unwrap();

    assert_eq!(
        registry.register("kitchen", &second),
        Err(Error::Configuration(ConfigurationError::DuplicateName))
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn empty_and_long_names_are_rejected() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 4>::new();

    assert_eq!(
        registry.register("   ", &light),
        Err(Error::Configuration(ConfigurationError::EmptyName))
    );
    assert_eq!(
        registry.register("a name that is way longer than thirty two bytes", &light),
        Err(Error::Configuration(ConfigurationError::NameTooLong))
    );
    assert!(registry.is_empty());
}

#[test]
fn capacity_is_enforced() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    registry.register("One", &light).unwrap();
    registry.register("Two", &light).unwrap();

    assert_eq!(
        registry.register("Three", &light),
        Err(Error::Configuration(ConfigurationError::TooManyDevices))
    );
}

#[test]
fn initial_state_comes_from_the_light() {
    let light = FakeLight::new(LightState::on().with_brightness(150));
    let mut registry = DeviceRegistry::<_, 2>::new();
    let id = registry.register("Lamp", &light).unwrap();

    let state = registry.get(id).unwrap().state();
    assert!(state.is_on);
    assert_eq!(state.brightness, Some(100));
}

// -----------------------------------------------------------------------------
// Lookup
// -----------------------------------------------------------------------------

#[test]
fn unknown_id_is_not_found() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    registry.register("Lamp", &light).unwrap();

    assert!(matches!(registry.get(id(2)), Err(Error::NotFound)));
    assert_eq!(DeviceId::new(0), None);
    assert_eq!(DeviceId::parse("0"), None);
    assert_eq!(DeviceId::parse("x1"), None);
}

#[test]
fn find_ignores_case() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Desk Lamp", &light).unwrap();

    assert_eq!(registry.find("desk lamp"), Some(lamp));
    assert_eq!(registry.find("Ceiling"), None);
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

#[test]
fn brightness_implies_power() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Lamp", &light).unwrap();

    let state = registry.apply(lamp, LightCommand::SetBrightness(40)).unwrap();
    assert_eq!(state, LightState::on().with_brightness(40));

    let state = registry.apply(lamp, LightCommand::SetBrightness(0)).unwrap();
    assert_eq!(state, LightState::off().with_brightness(0));
    assert_eq!(light.state(), state);
}

#[test]
fn out_of_range_brightness_leaves_state_untouched() {
    let light = FakeLight::new(LightState::on().with_brightness(30));
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Lamp", &light).unwrap();

    assert_eq!(
        registry.apply(lamp, LightCommand::SetBrightness(101)),
        Err(Error::InvalidRange)
    );
    assert_eq!(registry.get(lamp).unwrap().state(), LightState::on().with_brightness(30));
    assert_eq!(light.writes(), 0);
}

#[test]
fn hardware_failure_keeps_cached_state() {
    let light = FakeLight::new(LightState::off().with_brightness(60));
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Lamp", &light).unwrap();
    light.set_failing(true);

    assert_eq!(
        registry.apply(lamp, LightCommand::TurnOn),
        Err(Error::Hardware(HardwareError::Unavailable))
    );
    assert_eq!(registry.get(lamp).unwrap().state(), LightState::off().with_brightness(60));
}

#[test]
fn turn_on_and_off_keep_brightness() {
    let light = FakeLight::new(LightState::off().with_brightness(25));
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Lamp", &light).unwrap();

    let on = registry.apply(lamp, LightCommand::TurnOn).unwrap();
    assert_eq!(on, LightState::on().with_brightness(25));

    let off = registry.apply(lamp, LightCommand::TurnOff).unwrap();
    assert_eq!(off, LightState::off().with_brightness(25));
}

#[test]
fn turn_on_after_dimming_to_zero_restores_full_brightness() {
    let light = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    let lamp = registry.register("Lamp", &light).unwrap();
    registry.apply(lamp, LightCommand::SetBrightness(0)).unwrap();

    let state = registry.apply(lamp, LightCommand::TurnOn).unwrap();
    assert_eq!(state, LightState::on().with_brightness(100));
}

#[test]
fn devices_keep_independent_state() {
    let kitchen = FakeLight::default();
    let hall = FakeLight::default();
    let mut registry = DeviceRegistry::<_, 2>::new();
    let kitchen_id = registry.register("Kitchen", &kitchen).unwrap();
    let hall_id = registry.register("Hall", &hall).unwrap();

    registry.apply(kitchen_id, LightCommand::TurnOn).unwrap();

    assert!(registry.get(kitchen_id).unwrap().state().is_on);
    assert!(!registry.get(hall_id).unwrap().state().is_on);
    assert_eq!(hall.writes(), 0);
}

#[test]
fn command_names_are_parsed() {
    assert_eq!(LightCommand::from_name("turn_on", None), Ok(LightCommand::TurnOn));
    assert_eq!(LightCommand::from_name("turn_off", None), Ok(LightCommand::TurnOff));
    assert_eq!(
        LightCommand::from_name("set_brightness", Some(70)),
        Ok(LightCommand::SetBrightness(70))
    );
    assert_eq!(
        LightCommand::from_name("set_brightness", None),
        Err(Error::MalformedRequest)
    );
    assert_eq!(LightCommand::from_name("blink", None), Err(Error::MalformedRequest));
}

#[test]
fn negative_levels_are_out_of_range() {
    assert_eq!(
        LightCommand::from_name("set_brightness", Some(-5)),
        Err(Error::InvalidRange)
    );
    assert_eq!(
        LightCommand::from_name("set_brightness", Some(70_000)),
        Err(Error::InvalidRange)
    );
}
