//! Installation trees for the common distribution shapes.

use tempfile::TempDir;

use super::InstallTree;

/// Eigen: headers only, with an include-path-only `eigen3.pc`.
pub fn eigen() -> TempDir {
    InstallTree::new()
        .file("include/eigen3/Eigen/Dense", "#include \"Core\"\n")
        .file("include/eigen3/Eigen/Core", "#pragma once\n")
        .header("include/eigen3/Eigen/src/Core/Matrix.h")
        .pkgconfig(
            "share/pkgconfig/eigen3.pc",
            "Name: Eigen3\nDescription: A C++ template library for linear algebra\n\
             Version: 3.4.0\nCflags: -I${includedir}/eigen3\n",
        )
        .build()
}

/// x264: one shared library with its descriptor.
pub fn x264() -> TempDir {
    InstallTree::new()
        .header("include/x264.h")
        .header("include/x264_config.h")
        .shared_lib("lib", "x264", "164")
        .pkgconfig(
            "lib/pkgconfig/x264.pc",
            "Name: x264\nDescription: H.264 (MPEG4 AVC) encoder library\n\
             Version: 0.164.3095\nLibs: -L${libdir} -lx264\n\
             Libs.private: -lpthread -lm -ldl\nCflags: -I${includedir}\n",
        )
        .build()
}

const FFMPEG_LIBS: &[(&str, &str, &str)] = &[
    ("avutil", "57.28.100", ""),
    ("swresample", "4.7.100", "libavutil >= 57.28.100"),
    ("swscale", "6.7.100", "libavutil >= 57.28.100"),
    ("avcodec", "59.37.100", "libswresample >= 4.7.100, libavutil >= 57.28.100"),
    ("avformat", "59.27.100", "libavcodec >= 59.37.100, libavutil >= 57.28.100"),
];

/// FFmpeg: five shared components with `Requires` edges and a hints file.
pub fn ffmpeg_components() -> TempDir {
    let mut tree = InstallTree::new().file(
        "share/ffmpeg/depconf.toml",
        "namespace = \"FFmpeg\"\nversion = \"5.1.6\"\n",
    );

    for (lib, version, requires) in FFMPEG_LIBS {
        tree = tree
            .header(&format!("include/lib{}/{}.h", lib, lib))
            .shared_lib("lib", lib, version)
            .pkgconfig(
                &format!("lib/pkgconfig/lib{}.pc", lib),
                &format!(
                    "Name: lib{lib}\nVersion: {version}\nRequires: {requires}\n\
                     Libs: -L${{libdir}} -l{lib}\nLibs.private: -lm\nCflags: -I${{includedir}}\n"
                ),
            );
    }

    tree.build()
}

/// FFmpeg as system descriptors only: the libraries live elsewhere.
pub fn ffmpeg_interface() -> TempDir {
    let mut tree = InstallTree::new();

    for lib in ["avcodec", "avformat", "avutil"] {
        tree = tree.header(&format!("include/lib{}/{}.h", lib, lib)).pkgconfig(
            &format!("lib/pkgconfig/lib{}.pc", lib),
            &format!(
                "Name: lib{lib}\nVersion: 5.1.6\n\
                 Libs: -L/usr/lib/x86_64-linux-gnu -l{lib}\n\
                 Cflags: -I${{includedir}} -D__STDC_CONSTANT_MACROS\n"
            ),
        );
    }

    tree.build()
}

/// yaml-cpp as an unbuilt CMake project.
pub fn source_tree() -> TempDir {
    InstallTree::new()
        .file(
            "CMakeLists.txt",
            "cmake_minimum_required(VERSION 3.16)\nproject(yaml-cpp CXX)\n",
        )
        .header("include/yaml-cpp/yaml.h")
        .file("src/parse.cpp", "int parse() { return 0; }\n")
        .static_lib("build", "yaml-cpp")
        .build()
}
