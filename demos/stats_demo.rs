use clap::Parser;
use probe_hash::EmptyKey;
use probe_hash::HashTable;
use probe_hash::Intrinsic;
use probe_hash::Linear;
use probe_hash::RobinHood;
use probe_hash::hash_table::Entry;
use probe_hash::hash_table::ProbePolicy;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = probe_hash::DEFAULT_LOAD_FACTOR)]
    load_factor: f64,

    /// Use Robin Hood displacement instead of plain linear probing.
    #[arg(short = 'r', long = "robin_hood")]
    robin_hood: bool,
}

fn fill<P: ProbePolicy>(args: &Args) {
    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64, u64, Intrinsic, P> =
        HashTable::with_capacity_load_factor_and_strategy(
            args.target_capacity,
            args.load_factor,
            Intrinsic,
        );

    println!("Actual capacity: {}", table.capacity());
    println!("Slot count: {}", table.slot_count());
    println!("Filling table with u64 values...");

    let mut num_failures = 0;
    let num_values = table.capacity() as u64;
    for i in 1..=num_values {
        match table.entry(i) {
            Entry::Vacant(entry) => {
                if entry.try_insert(i).is_err() {
                    num_failures += 1;
                }
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", i);
            }
        }
    }

    // The empty key lives outside the slot array and never lengthens a probe.
    table.insert(u64::empty(), 0);

    println!("Inserted {} values into table", table.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.slot_count() as f64) * 100.0
    );

    table.probe_histogram().print();
    table.debug_stats().print();
    println!(
        "Number of failed insertions: {} ({:.02}%)",
        num_failures,
        num_failures as f64 / num_values as f64 * 100.0
    );
    println!("Perturbation: {:#018x}", table.perturbation());
}

fn main() {
    let args = Args::parse();

    if args.robin_hood {
        fill::<RobinHood>(&args);
    } else {
        fill::<Linear>(&args);
    }
}
