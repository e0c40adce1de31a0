//! Traffic Light State Machine
//!
//! A pedestrian crossing modelled as a hierarchical machine: the normal
//! red/green cycle runs inside a composite state, and a pedestrian request
//! drives the sub-machine to completion, which bumps the parent into the
//! crossing phase.
//!
//! Run with: cargo run --example traffic_light

use tabula::{context, rule, Inj, Machine, TransitionTable, X};

struct Tick;
struct Request;
struct Crossed;

fn announce(message: &'static str) -> impl Fn(Inj<Vec<&'static str>>) + 'static {
    move |log: Inj<Vec<&'static str>>| {
        println!("  {message}");
        log.borrow_mut().push(message);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let cycle = TransitionTable::builder()
        .rule(rule("red").initial().entry_any().action(announce("red: stop")))
        .rule(rule("red").on::<Tick>().to("green"))
        .rule(rule("green").entry_any().action(announce("green: go")))
        .rule(rule("green").on::<Tick>().to("red"))
        .rule(rule("green").on::<Request>().to(X))
        .rule(rule("red").on::<Request>().to(X))
        .build()
        .unwrap();

    let table = TransitionTable::builder()
        .rule(rule("cycling").initial().action(announce("pedestrian waiting")).to("crossing"))
        .rule(rule("crossing").entry_any().action(announce("walk light on")))
        .rule(rule("crossing").on::<Crossed>().to("cycling"))
        .submachine("cycling", cycle)
        .build()
        .unwrap();

    let log = context![Vec::<&'static str>::new()];
    let mut machine = Machine::new(table, log.clone()).expect("machine construction");

    println!("\nRunning the light for a few ticks:");
    machine.process_event(Tick).unwrap();
    machine.process_event(Tick).unwrap();

    println!("\nA pedestrian presses the button:");
    machine.process_event(Request).unwrap();
    assert!(machine.is("crossing"));

    println!("\nThe pedestrian has crossed; back to cycling:");
    machine.process_event(Crossed).unwrap();
    assert!(machine.is("cycling"));
    assert!(machine.is_in("cycling", "red"));

    println!("\nObserved announcements: {:?}", log.get::<Vec<&'static str>>().unwrap().borrow());
    println!("\n=== Example Complete ===");
}
