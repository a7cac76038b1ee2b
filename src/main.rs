fn main() -> std::io::Result<()> {
    chemviz_lib::run()
}
