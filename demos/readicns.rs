use iconfamily::IconFamily;
use std::env;

fn main() {
    if env::args().count() != 2 {
        println!("Usage: readicns <path>");
        return;
    }
    let path = env::args().nth(1).unwrap();
    let family = IconFamily::read_from_file(path)
        .expect("failed to read ICNS file");
    println!("ICNS file contains {} element(s).", family.elements().len());
    for (index, element) in family.elements().iter().enumerate() {
        let size = match element.element_type() {
            Some(element_type) => {
                format!("{}x{}", element_type.pixel_size(), element_type.pixel_size())
            }
            None => "unknown type".to_string(),
        };
        println!("Element {}: {} ({}, {} byte payload)",
                 index,
                 element.ostype(),
                 size,
                 element.data().len());
    }
}
