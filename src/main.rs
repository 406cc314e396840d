fn main() {
    smith::cli::run();
}
