use truss3d::{force, point, LoadCase, Section, StressUnit, TrussBuilder, TrussReport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three pinned feet on the ground and an apex carrying a downward load
    let steel = Section::new(200.0e9, 7_850.0, 5.0e-4);
    let mut builder = TrussBuilder::new();
    let feet = [
        builder.add_joint(point(1.0, 0.0, 0.0)),
        builder.add_joint(point(-0.5, 0.866, 0.0)),
        builder.add_joint(point(-0.5, -0.866, 0.0)),
    ];
    let apex = builder.add_joint(point(0.0, 0.0, 1.5));
    for (i, &foot) in feet.iter().enumerate() {
        builder.add_member(foot, apex, steel)?;
        builder.add_member(foot, feet[(i + 1) % feet.len()], steel)?;
    }
    let mut truss = builder.build()?;

    // Pin every foot and hang 10 kN off the apex
    let mut case = LoadCase::new(truss.node_count());
    for foot in feet {
        case.fix_node(foot.index())?;
    }
    case.set_load(apex.index(), force(0.0, 0.0, -10_000.0))?;
    truss.solve(&case)?;

    println!("{}", TrussReport::from_truss(&truss).render(StressUnit::MPa));
    Ok(())
}
