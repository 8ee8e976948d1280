//! Seed data for worlds: the fixed demo roster and random fleets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rover_core::component::{
    Identity, Lifecycle, ModuleCategory, ModuleMetadata, Modules, Position, Status, Vitals,
};
use rover_core::{EntityId, EntityStatus, StoreResult, World};

struct DemoModule {
    id: &'static str,
    name: &'static str,
    category: ModuleCategory,
    description: &'static str,
}

struct DemoBot {
    callsign: &'static str,
    name: &'static str,
    position: (f64, f64),
    status: EntityStatus,
    modules: &'static [DemoModule],
    last_heartbeat: &'static str,
    uptime_seconds: u64,
    notes: &'static str,
    battery_level: f64,
    temperature_c: f64,
}

const ROSTER: &[DemoBot] = &[
    DemoBot {
        callsign: "alpha",
        name: "Alpha Runner",
        position: (20.0, 35.0),
        status: EntityStatus::Moving,
        modules: &[
            DemoModule {
                id: "alpha-scan",
                name: "WideScan Lidar",
                category: ModuleCategory::Sensor,
                description: "Long-range lidar array streaming distance samples.",
            },
            DemoModule {
                id: "alpha-move",
                name: "Vector Drive",
                category: ModuleCategory::Actuator,
                description: "Omnidirectional thruster pack allowing strafed movement.",
            },
            DemoModule {
                id: "alpha-mem",
                name: "Memory Vault",
                category: ModuleCategory::Utility,
                description: "Solid-state module backing script heap and scratch buffers.",
            },
        ],
        last_heartbeat: "2.4s ago",
        uptime_seconds: 1894,
        notes: "Executing patrol loop segment 3.",
        battery_level: 82.0,
        temperature_c: 36.5,
    },
    DemoBot {
        callsign: "bravo",
        name: "Bravo Scout",
        position: (55.0, 64.0),
        status: EntityStatus::Idle,
        modules: &[
            DemoModule {
                id: "bravo-cam",
                name: "Spectral Camera",
                category: ModuleCategory::Sensor,
                description: "Captures multispectral frames for environment analysis.",
            },
            DemoModule {
                id: "bravo-comm",
                name: "Relay Mesh",
                category: ModuleCategory::Comm,
                description: "Maintains low-latency channel to nearby units.",
            },
        ],
        last_heartbeat: "0.9s ago",
        uptime_seconds: 9840,
        notes: "Awaiting new survey instructions.",
        battery_level: 64.0,
        temperature_c: 33.1,
    },
    DemoBot {
        callsign: "charlie",
        name: "Charlie Worker",
        position: (78.0, 28.0),
        status: EntityStatus::Error,
        modules: &[
            DemoModule {
                id: "charlie-arm",
                name: "Manipulator Arm",
                category: ModuleCategory::Actuator,
                description: "Multi-tool gripper for material handling tasks.",
            },
            DemoModule {
                id: "charlie-diagnostics",
                name: "Diagnostics HUD",
                category: ModuleCategory::Utility,
                description: "Surface subsystem diagnostics and fault codes.",
            },
        ],
        last_heartbeat: "15.7s ago",
        uptime_seconds: 412,
        notes: "Fault: actuator overload. Awaiting technician override.",
        battery_level: 48.0,
        temperature_c: 41.9,
    },
];

/// Everything a bot is spawned with.
#[derive(Debug, Clone)]
pub struct BotSpec {
    /// Identity component.
    pub identity: Identity,
    /// Starting position.
    pub position: Position,
    /// Starting status.
    pub status: EntityStatus,
    /// Fitted modules.
    pub modules: Vec<ModuleMetadata>,
    /// Lifecycle component.
    pub lifecycle: Lifecycle,
    /// Vitals component.
    pub vitals: Vitals,
}

impl BotSpec {
    /// Spawn this bot into `world`.
    pub fn spawn(self, world: &mut World) -> StoreResult<EntityId> {
        let id = world.spawn();
        world.insert(id, self.identity)?;
        world.insert(id, self.position)?;
        world.insert(id, Status::new(self.status))?;
        world.insert(id, Modules { items: self.modules })?;
        world.insert(id, self.lifecycle)?;
        world.insert(id, self.vitals)?;
        Ok(id)
    }
}

/// The fixed demo roster: `alpha`, `bravo`, and `charlie`.
pub fn demo_roster() -> Vec<BotSpec> {
    ROSTER
        .iter()
        .map(|bot| BotSpec {
            identity: Identity::new(bot.callsign, bot.name),
            position: Position::new(bot.position.0, bot.position.1),
            status: bot.status,
            modules: bot
                .modules
                .iter()
                .map(|m| {
                    ModuleMetadata::new(m.id, m.name, m.category).with_description(m.description)
                })
                .collect(),
            lifecycle: Lifecycle {
                uptime_seconds: bot.uptime_seconds,
                last_heartbeat: bot.last_heartbeat.to_string(),
                notes: bot.notes.to_string(),
            },
            vitals: Vitals {
                battery_level: bot.battery_level,
                temperature_c: bot.temperature_c,
            },
        })
        .collect()
}

/// Spawn the demo roster. Returns the new entities in roster order.
pub fn populate_demo_world(world: &mut World) -> StoreResult<Vec<EntityId>> {
    let ids = demo_roster()
        .into_iter()
        .map(|bot| bot.spawn(world))
        .collect::<StoreResult<Vec<_>>>()?;
    tracing::debug!(bots = ids.len(), "demo world populated");
    Ok(ids)
}

const CALLSIGNS: &[&str] = &[
    "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet", "kilo", "lima", "mike",
];

const CHASSIS: &[(&str, ModuleCategory)] = &[
    ("Survey Lidar", ModuleCategory::Sensor),
    ("Track Drive", ModuleCategory::Actuator),
    ("Cargo Clamp", ModuleCategory::Actuator),
    ("Thermal Eye", ModuleCategory::Sensor),
    ("Burst Radio", ModuleCategory::Comm),
    ("Cache Core", ModuleCategory::Utility),
];

/// Spawn `count` random bots from a seeded generator.
///
/// The same seed always produces the same fleet, serials included.
pub fn populate_random(world: &mut World, count: usize, seed: u64) -> StoreResult<Vec<EntityId>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = Vec::with_capacity(count);

    for index in 0..count {
        let base = CALLSIGNS[index % CALLSIGNS.len()];
        let callsign = match index / CALLSIGNS.len() {
            0 => base.to_string(),
            round => format!("{base}-{round}"),
        };
        let mut name = callsign.clone();
        if let Some(first) = name.get_mut(..1) {
            first.make_ascii_uppercase();
        }

        let module_count = rng.random_range(1..=3);
        let modules = (0..module_count)
            .map(|slot| {
                let (label, category) = CHASSIS[rng.random_range(0..CHASSIS.len())];
                ModuleMetadata::new(format!("{callsign}-{slot}"), label, category)
                    .with_power_draw(f64::from(rng.random_range(5..=40_u32)))
            })
            .collect();

        let battery_level = f64::from(rng.random_range(5..=100_u32));
        let status = match rng.random_range(0..10) {
            0 => EntityStatus::Error,
            1..=3 => EntityStatus::Moving,
            _ => EntityStatus::Idle,
        };

        let bot = BotSpec {
            identity: Identity {
                serial: uuid::Builder::from_random_bytes(rng.random()).into_uuid(),
                callsign: callsign.clone(),
                name: format!("{name} Unit"),
            },
            position: Position::new(
                (rng.random_range(0.0..100.0_f64) * 10.0).round() / 10.0,
                (rng.random_range(0.0..100.0_f64) * 10.0).round() / 10.0,
            ),
            status,
            modules,
            lifecycle: Lifecycle {
                uptime_seconds: rng.random_range(0..20_000),
                last_heartbeat: "just now".to_string(),
                notes: String::new(),
            },
            vitals: Vitals {
                battery_level,
                temperature_c: f64::from(rng.random_range(300..=420_u32)) / 10.0,
            },
        };
        ids.push(bot.spawn(world)?);
    }

    tracing::debug!(bots = ids.len(), seed, "random fleet populated");
    Ok(ids)
}

/// The entity whose [`Identity`] has `callsign`.
pub fn find_by_callsign(world: &World, callsign: &str) -> Option<EntityId> {
    world
        .query::<(Identity,)>()
        .into_iter()
        .find(|(_, (identity,))| identity.callsign == callsign)
        .map(|(id, _)| id)
}
