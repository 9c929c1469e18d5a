fn main() {
    tapsnap::cli::run();
}
