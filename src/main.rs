fn main() {
    ingot::main()
}
