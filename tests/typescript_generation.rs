//! TypeScript Generation Tests
//!
//! Validates that snapshot types can be exported to TypeScript when the tauri
//! feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_snapshot_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, every type a GUI reads is ready for TypeScript export.
    fn assert_type<T: Type>() {}

    // Snapshot types
    assert_type::<motionlink::BridgeState>();
    assert_type::<motionlink::GForces>();
    assert_type::<motionlink::TelemetryRecord>();
    assert_type::<motionlink::DriverInputs>();
    assert_type::<motionlink::SuspensionTravel>();

    // Status types
    assert_type::<motionlink::LinkStatus>();
    assert_type::<motionlink::BridgePhase>();
    assert_type::<motionlink::PacketVariant>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = motionlink::LinkStatus::Stopped;
}
