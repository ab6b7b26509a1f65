//! Scenario harness binary
//!
//! Drives the assembled engine against the in-process mock platform and
//! prints every platform call the engine issued, in order. Useful for
//! eyeballing enforcement flows without a real transport:
//!
//!   cargo run -p test-harness -- takeover
//!   cargo run -p test-harness -- eviction
//!   cargo run -p test-harness -- all

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use warden_core::config::EngineTunables;
use warden_core::core_dispatch::Engine;
use warden_core::core_platform::{
    ActorId, ChatMessage, Group, GroupAttribute, GroupId, MockPlatform, Operation, PlatformClient,
};
use warden_core::core_policy::{LockKind, MemoryPolicyStore, PolicyStore, ProtectionPolicy};
use warden_core::core_pool::IdentityPool;

#[derive(Parser, Debug)]
#[command(name = "test-harness")]
#[command(about = "Warden scenario harness over the mock platform", long_about = None)]
struct Args {
    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand, Debug, Clone)]
enum Scenario {
    /// Claim a group, then defend it against a rename and a link attack
    Takeover,
    /// Hostile eviction of a controlled identity, then reinstatement
    Eviction,
    /// Settings commands with echo dedup
    Commands,
    /// Run every scenario in sequence
    All,
}

const IDENTITIES: [&str; 3] = ["warden-0", "warden-1", "warden-2"];

struct World {
    platform: MockPlatform,
    store: Arc<MemoryPolicyStore>,
    engine: Arc<Engine>,
}

fn world() -> World {
    let platform = MockPlatform::new();
    let clients: Vec<Arc<dyn PlatformClient>> = IDENTITIES
        .iter()
        .map(|id| platform.client(*id) as Arc<dyn PlatformClient>)
        .collect();
    let pool = Arc::new(IdentityPool::new(clients).expect("pool construction"));
    let store = Arc::new(MemoryPolicyStore::new());
    let mut tunables = EngineTunables::default();
    tunables.greeting = Some("warden on duty".to_string());
    let engine = Engine::new(pool, store.clone(), tunables);
    World { platform, store, engine }
}

fn seed_group(platform: &MockPlatform, id: &str, extra_members: &[&str]) {
    let mut members: Vec<ActorId> = IDENTITIES.iter().map(|m| ActorId::new(*m)).collect();
    members.extend(extra_members.iter().map(|m| ActorId::new(*m)));
    platform.add_group(Group {
        id: GroupId::new(id),
        name: "Harness Group".to_string(),
        picture_ref: "pic-harness".to_string(),
        prevented_join_by_ticket: true,
        members,
    });
}

fn print_calls(world: &World, heading: &str) {
    println!("== {heading}");
    for call in world.platform.calls() {
        let group = call.group.as_ref().map(|g| g.as_str()).unwrap_or("-");
        let targets: Vec<&str> = call.targets.iter().map(|t| t.as_str()).collect();
        println!(
            "  {:<10} {:<28} group={:<10} targets={:?}",
            call.actor, call.op, group, targets
        );
    }
    for (sender, group, text) in world.platform.messages() {
        println!("  {sender} said in {group}: {text:?}");
    }
    println!();
}

async fn run_takeover() {
    let world = world();
    let dispatcher = world.engine.dispatcher();

    // A whitelisted admin invites the primary identity into a fresh group.
    world.platform.add_group(Group {
        id: GroupId::new("g-claim"),
        name: "Community Hall".to_string(),
        picture_ref: "pic-hall".to_string(),
        prevented_join_by_ticket: true,
        members: vec![ActorId::new("admin"), ActorId::new("member")],
    });
    world
        .platform
        .add_pending_invite(&GroupId::new("g-claim"), &ActorId::new("warden-0"), &ActorId::new("admin"));
    world.store.set_whitelisted(&ActorId::new("admin"), None).expect("whitelist");

    dispatcher
        .dispatch(Operation::InvitedIntoGroup {
            group: GroupId::new("g-claim"),
            inviter: ActorId::new("admin"),
            invitees: vec![ActorId::new("warden-0")],
        })
        .await;

    // Lock the name, then let an intruder rename and open the join link.
    world
        .store
        .set_lock(&GroupId::new("g-claim"), LockKind::Name, true)
        .expect("lock");
    world
        .store
        .set_lock(&GroupId::new("g-claim"), LockKind::Url, true)
        .expect("lock");

    let intruder = world.platform.client("intruder");
    let mut defaced = world.platform.group(&GroupId::new("g-claim")).expect("group");
    defaced.members.push(ActorId::new("intruder"));
    world.platform.add_group(defaced.clone());
    defaced.name = "OWNED".to_string();
    defaced.prevented_join_by_ticket = false;
    intruder.update_group(&defaced).await.expect("deface");

    dispatcher
        .dispatch(Operation::GroupAttributeChanged {
            group: GroupId::new("g-claim"),
            actor: ActorId::new("intruder"),
            attribute: GroupAttribute::Name,
        })
        .await;
    dispatcher
        .dispatch(Operation::GroupAttributeChanged {
            group: GroupId::new("g-claim"),
            actor: ActorId::new("intruder"),
            attribute: GroupAttribute::TicketPrevention,
        })
        .await;

    let healed = world.platform.group(&GroupId::new("g-claim")).expect("group");
    print_calls(&world, "takeover defense");
    println!(
        "final state: name={:?} prevention={} intruder_present={}",
        healed.name,
        healed.prevented_join_by_ticket,
        healed.members.contains(&ActorId::new("intruder"))
    );
    println!();
}

async fn run_eviction() {
    let world = world();
    let dispatcher = world.engine.dispatcher();

    seed_group(&world.platform, "g-evict", &["admin", "hostile"]);
    world
        .store
        .create_policy(&ProtectionPolicy::new(GroupId::new("g-evict"), ActorId::new("admin")))
        .expect("policy");

    // The hostile member kicks one of our identities out.
    world
        .platform
        .client("hostile")
        .kick_from_group(&GroupId::new("g-evict"), &[ActorId::new("warden-2")])
        .await
        .expect("kick");

    dispatcher
        .dispatch(Operation::KickedFromGroup {
            group: GroupId::new("g-evict"),
            actor: ActorId::new("hostile"),
            evicted: vec![ActorId::new("warden-2")],
        })
        .await;

    let group = world.platform.group(&GroupId::new("g-evict")).expect("group");
    print_calls(&world, "hostile eviction");
    println!(
        "final state: victim_back={} hostile_present={} prevention={}",
        group.members.contains(&ActorId::new("warden-2")),
        group.members.contains(&ActorId::new("hostile")),
        group.prevented_join_by_ticket
    );
    println!();
}

async fn run_commands() {
    let world = world();
    let dispatcher = world.engine.dispatcher();

    seed_group(&world.platform, "g-cmd", &["admin"]);
    world
        .store
        .create_policy(&ProtectionPolicy::new(GroupId::new("g-cmd"), ActorId::new("admin")))
        .expect("policy");

    // Each identity relays its own echo of the same command.
    for text in ["warden:status", "warden:status", "warden:lock:invite", "warden:locks"] {
        dispatcher
            .dispatch(Operation::MessageReceived {
                message: ChatMessage {
                    group: GroupId::new("g-cmd"),
                    sender: ActorId::new("admin"),
                    text: text.to_string(),
                },
            })
            .await;
    }

    print_calls(&world, "commands with echo dedup");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match args.scenario {
        Scenario::Takeover => run_takeover().await,
        Scenario::Eviction => run_eviction().await,
        Scenario::Commands => run_commands().await,
        Scenario::All => {
            run_takeover().await;
            run_eviction().await;
            run_commands().await;
        }
    }
    Ok(())
}
