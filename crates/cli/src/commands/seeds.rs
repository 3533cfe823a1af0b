use formscout_agent::available_seeds;

pub fn run() {
    println!("Built-in seeds:");
    for seed in available_seeds() {
        println!("  {:<10} {}", seed.name(), seed.description());
    }
}
